//! Column splitting
//!
//! Breaks a delimited string column apart, either into numbered columns or
//! into one record per part. Splitting a column whose schema type is not
//! string is a configuration error, rejected before any output is produced.

use crate::error::{Error, Result};
use crate::infer::infer_schema;
use crate::types::{Attribute, Schema, Table, Value, ValueKind};
use tracing::debug;

/// Split the string values of `column` into trimmed parts stored under
/// `column1`, `column2`, … The source column is removed; a record without
/// the column gains no parts.
pub fn split_column_into_columns(
    table: &Table,
    schema: Option<&Schema>,
    column: &str,
    delimiter: &str,
) -> Result<(Table, Schema)> {
    let schema = resolve_string_column(table, schema, column)?;
    debug!(rows = table.len(), column, "splitting column into columns");

    let mut result = Table::new();
    let mut max_parts = 0;
    for record in table {
        let mut out = record.clone();
        if let Some(Value::Str(text)) = out.shift_remove(column) {
            let parts = split_parts(&text, delimiter);
            max_parts = max_parts.max(parts.len());
            for (i, part) in parts.into_iter().enumerate() {
                out.insert(format!("{column}{}", i + 1), Value::Str(part));
            }
        }
        result.push(out);
    }

    let mut out_schema: Schema = schema
        .iter()
        .filter(|(name, _)| name.as_str() != column)
        .map(|(name, attr)| (name.clone(), attr.clone()))
        .collect();
    for i in 1..=max_parts {
        out_schema.insert(format!("{column}{i}"), Attribute::new(ValueKind::Str));
    }
    Ok((result, out_schema))
}

/// Split the string values of `column` into one record per trimmed part,
/// the part stored back under the source column name. Records without the
/// column pass through once, unchanged.
pub fn split_column_into_records(
    table: &Table,
    schema: Option<&Schema>,
    column: &str,
    delimiter: &str,
) -> Result<(Table, Schema)> {
    let schema = resolve_string_column(table, schema, column)?;
    debug!(rows = table.len(), column, "splitting column into records");

    let mut result = Table::new();
    for record in table {
        match record.get(column) {
            Some(Value::Str(text)) => {
                for part in split_parts(text, delimiter) {
                    let mut out = record.clone();
                    out.insert(column.to_string(), Value::Str(part));
                    result.push(out);
                }
            }
            _ => result.push(record.clone()),
        }
    }
    Ok((result, schema))
}

fn split_parts(text: &str, delimiter: &str) -> Vec<String> {
    text.split(delimiter).map(|part| part.trim().to_string()).collect()
}

fn resolve_string_column(table: &Table, schema: Option<&Schema>, column: &str) -> Result<Schema> {
    let schema = match schema {
        Some(schema) => schema.clone(),
        None => infer_schema(table),
    };
    let attr = schema
        .get(column)
        .ok_or_else(|| Error::ColumnNotFound(column.to_string()))?;
    if attr.kind != ValueKind::Str {
        return Err(Error::ColumnTypeMismatch {
            column: column.to_string(),
            expected: ValueKind::Str.to_string(),
            found: attr.kind.to_string(),
        });
    }
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(json: serde_json::Value) -> Table {
        serde_json::from_value(json).unwrap()
    }

    fn json_rows(table: &Table) -> serde_json::Value {
        serde_json::to_value(table).unwrap()
    }

    #[test]
    fn splits_into_numbered_trimmed_columns() {
        let data = table(serde_json::json!([
            {"id": 1, "tags": "red, green , blue"},
            {"id": 2, "tags": "solo"}
        ]));
        let (rows, schema) = split_column_into_columns(&data, None, "tags", ",").unwrap();
        assert_eq!(
            json_rows(&rows),
            serde_json::json!([
                {"id": 1, "tags1": "red", "tags2": "green", "tags3": "blue"},
                {"id": 2, "tags1": "solo"}
            ])
        );
        assert_eq!(
            schema.keys().collect::<Vec<_>>(),
            ["id", "tags1", "tags2", "tags3"]
        );
    }

    #[test]
    fn records_without_the_column_gain_no_parts() {
        let data = table(serde_json::json!([
            {"id": 1, "tags": "a;b"},
            {"id": 2}
        ]));
        let (rows, _) = split_column_into_columns(&data, None, "tags", ";").unwrap();
        assert_eq!(
            json_rows(&rows),
            serde_json::json!([
                {"id": 1, "tags1": "a", "tags2": "b"},
                {"id": 2}
            ])
        );
    }

    #[test]
    fn splits_into_one_record_per_part() {
        let data = table(serde_json::json!([
            {"id": 1, "tags": "a, b"},
            {"id": 2, "tags": "c"}
        ]));
        let (rows, schema) = split_column_into_records(&data, None, "tags", ",").unwrap();
        assert_eq!(
            json_rows(&rows),
            serde_json::json!([
                {"id": 1, "tags": "a"},
                {"id": 1, "tags": "b"},
                {"id": 2, "tags": "c"}
            ])
        );
        assert_eq!(schema["tags"].kind, ValueKind::Str);
    }

    #[test]
    fn non_string_column_is_rejected_up_front() {
        let data = table(serde_json::json!([{"n": 4}]));
        assert_eq!(
            split_column_into_columns(&data, None, "n", ",").unwrap_err(),
            Error::ColumnTypeMismatch {
                column: "n".into(),
                expected: "string".into(),
                found: "integer".into(),
            }
        );
        assert_eq!(
            split_column_into_records(&data, None, "missing", ",").unwrap_err(),
            Error::ColumnNotFound("missing".into())
        );
    }

    #[test]
    fn empty_string_still_yields_one_part() {
        let data = table(serde_json::json!([{"tags": ""}]));
        let (rows, _) = split_column_into_records(&data, None, "tags", ",").unwrap();
        assert_eq!(json_rows(&rows), serde_json::json!([{"tags": ""}]));
    }
}
