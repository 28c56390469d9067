//! Shared fixtures and helpers for the scenario tests.
#![allow(dead_code)]

use rowset::{Schema, Table};

/// Build a table from a JSON array-of-objects literal.
pub fn table(json: serde_json::Value) -> Table {
    serde_json::from_value(json).expect("fixture must be an array of objects")
}

/// Render a table back to JSON for whole-shape assertions, column order
/// included.
pub fn json_rows(table: &Table) -> serde_json::Value {
    serde_json::to_value(table).expect("tables are always serializable")
}

/// Column names in schema order.
pub fn columns(schema: &Schema) -> Vec<&str> {
    schema.keys().map(String::as_str).collect()
}

/// A small sensor-observation feed with nested structures, in the shape a
/// SensorThings-style API returns.
pub fn observation_feed() -> Table {
    table(serde_json::json!([
        {
            "@iot.selfLink": "http://host/Datastreams(1)",
            "name": "air-temp-a",
            "unitOfMeasurement": {"name": "degree Celsius", "symbol": "°C"},
            "Observations": [
                {"phenomenonTime": "2024-03-01T10:00:00Z", "result": 11.5},
                {"phenomenonTime": "2024-03-14T10:00:00Z", "result": 14.0},
                {"phenomenonTime": "2024-04-02T10:00:00Z", "result": 17.5}
            ]
        },
        {
            "@iot.selfLink": "http://host/Datastreams(2)",
            "name": "air-temp-b",
            "unitOfMeasurement": {"name": "degree Celsius", "symbol": "°C"},
            "Observations": [
                {"phenomenonTime": "2024-03-20T10:00:00Z", "result": 9.0}
            ]
        }
    ]))
}
