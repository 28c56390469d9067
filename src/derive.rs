//! Derived columns
//!
//! Builders that append one column to every record of a table, in place.
//! Statistic columns reduce a set of existing columns per row through the
//! aggregation library; formula columns evaluate a parsed arithmetic
//! expression per row.

use crate::aggregate;
use crate::error::Result;
use crate::formula::Formula;
use crate::types::{Table, Value};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Per-row reduction across a set of columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowFunction {
    Sum,
    Product,
    Min,
    Max,
    Mean,
    Variance,
    StandardDeviation,
    Median,
    Q1,
    Q3,
    Mode,
    First,
    Last,
    Random,
    Concatenate,
    Range,
}

impl RowFunction {
    fn is_numeric(&self) -> bool {
        matches!(
            self,
            RowFunction::Sum
                | RowFunction::Product
                | RowFunction::Min
                | RowFunction::Max
                | RowFunction::Mean
                | RowFunction::Variance
                | RowFunction::StandardDeviation
                | RowFunction::Range
        )
    }
}

/// Append `name` with an empty-string value to every record.
pub fn add_empty_column(table: &mut Table, name: &str) {
    for record in table.iter_mut() {
        record.insert(name.to_string(), Value::Str(String::new()));
    }
}

/// Append `name` with the same value in every record.
pub fn add_constant_column(table: &mut Table, name: &str, value: &Value) {
    for record in table.iter_mut() {
        record.insert(name.to_string(), value.clone());
    }
}

/// Append `name` counting up from `base` in row order.
pub fn add_autoincrement_column(table: &mut Table, name: &str, base: i64) {
    for (index, record) in table.iter_mut().enumerate() {
        record.insert(name.to_string(), Value::Integer(base + index as i64));
    }
}

/// Append `name` as a per-row reduction of `columns`, with ambient
/// randomness for the sampling functions.
pub fn add_statistic_column(
    table: &mut Table,
    name: &str,
    columns: &[String],
    function: RowFunction,
    decimals: Option<u32>,
) {
    add_statistic_column_with_rng(table, name, columns, function, decimals, &mut rand::thread_rng())
}

/// Like [`add_statistic_column`] with a caller-supplied random source.
///
/// Listed columns that a record does not carry, and null values, contribute
/// nothing; numeric functions additionally coerce strings and skip
/// unparsable entries. A row whose filtered input is empty leaves the
/// column absent.
pub fn add_statistic_column_with_rng<R: Rng + ?Sized>(
    table: &mut Table,
    name: &str,
    columns: &[String],
    function: RowFunction,
    decimals: Option<u32>,
    rng: &mut R,
) {
    debug!(rows = table.len(), columns = columns.len(), ?function, "adding statistic column");
    for record in table.iter_mut() {
        let value = if function.is_numeric() {
            let numbers: Vec<f64> = columns
                .iter()
                .filter_map(|column| record.get(column))
                .filter_map(Value::as_number)
                .collect();
            if numbers.is_empty() {
                None
            } else {
                let result = match function {
                    RowFunction::Sum => Some(aggregate::sum(&numbers)),
                    RowFunction::Product => Some(numbers.iter().product()),
                    RowFunction::Min => Some(aggregate::min_value(&numbers)),
                    RowFunction::Max => Some(aggregate::max_value(&numbers)),
                    RowFunction::Mean => Some(aggregate::mean(&numbers)),
                    RowFunction::Variance => aggregate::variance(&numbers),
                    RowFunction::StandardDeviation => aggregate::standard_deviation(&numbers),
                    RowFunction::Range => Some(aggregate::range(&numbers)),
                    _ => None,
                };
                result.map(|n| render_number(n, decimals))
            }
        } else {
            let values: Vec<Value> = columns
                .iter()
                .filter_map(|column| record.get(column))
                .filter(|value| !value.is_null())
                .cloned()
                .collect();
            if values.is_empty() {
                None
            } else {
                let result = match function {
                    RowFunction::Median => aggregate::median(&values),
                    RowFunction::Q1 => aggregate::q1(&values),
                    RowFunction::Q3 => aggregate::q3(&values),
                    RowFunction::Mode => aggregate::mode(&values, rng),
                    RowFunction::First => Some(values[0].clone()),
                    RowFunction::Last => Some(values[values.len() - 1].clone()),
                    RowFunction::Random => aggregate::random_value(&values, rng).cloned(),
                    RowFunction::Concatenate => Some(Value::Str(aggregate::concatenate(&values))),
                    _ => None,
                };
                result.map(|value| match value.as_number() {
                    Some(n) if decimals.is_some() => render_number(n, decimals),
                    _ => value,
                })
            }
        };
        if let Some(value) = value {
            record.insert(name.to_string(), value);
        }
    }
}

/// Append `name` as the formula's value per row. Rows where a referenced
/// column is missing or not numeric are left without the column.
pub fn add_formula_column(
    table: &mut Table,
    name: &str,
    formula: &str,
    decimals: Option<u32>,
) -> Result<()> {
    let formula = Formula::parse(formula)?;
    debug!(rows = table.len(), "adding formula column");
    for record in table.iter_mut() {
        if let Ok(n) = formula.eval(record) {
            record.insert(name.to_string(), render_number(n, decimals));
        }
    }
    Ok(())
}

/// Zero decimals rounds to an integer value, a positive count formats a
/// fixed-decimal string, and no count leaves the number as computed.
fn render_number(n: f64, decimals: Option<u32>) -> Value {
    match decimals {
        Some(0) => Value::canonical_number(n.round()),
        Some(d) => Value::Str(format!("{n:.prec$}", prec = d as usize)),
        None => Value::canonical_number(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn table(json: serde_json::Value) -> Table {
        serde_json::from_value(json).unwrap()
    }

    fn json_rows(table: &Table) -> serde_json::Value {
        serde_json::to_value(table).unwrap()
    }

    fn names(columns: &[&str]) -> Vec<String> {
        columns.iter().map(|&s| s.to_string()).collect()
    }

    #[test]
    fn simple_builders_fill_every_row() {
        let mut data = table(serde_json::json!([{"a": 1}, {"a": 2}]));
        add_empty_column(&mut data, "note");
        add_constant_column(&mut data, "site", &Value::Str("S1".into()));
        add_autoincrement_column(&mut data, "seq", 100);
        assert_eq!(
            json_rows(&data),
            serde_json::json!([
                {"a": 1, "note": "", "site": "S1", "seq": 100},
                {"a": 2, "note": "", "site": "S1", "seq": 101}
            ])
        );
    }

    #[test]
    fn statistic_column_reduces_across_columns_per_row() {
        let mut data = table(serde_json::json!([
            {"jan": 2, "feb": 4, "mar": 6},
            {"jan": 10, "feb": "20"}
        ]));
        add_statistic_column(&mut data, "total", &names(&["jan", "feb", "mar"]), RowFunction::Sum, None);
        add_statistic_column(&mut data, "peak", &names(&["jan", "feb", "mar"]), RowFunction::Max, None);
        assert_eq!(
            json_rows(&data),
            serde_json::json!([
                {"jan": 2, "feb": 4, "mar": 6, "total": 12, "peak": 6},
                {"jan": 10, "feb": "20", "total": 30, "peak": 20}
            ])
        );
    }

    #[test]
    fn product_multiplies_the_row_values() {
        let mut data = table(serde_json::json!([{"a": 3, "b": 4}]));
        add_statistic_column(&mut data, "p", &names(&["a", "b"]), RowFunction::Product, None);
        assert_eq!(data[0]["p"], Value::Integer(12));
    }

    #[test]
    fn empty_filtered_input_leaves_the_column_absent() {
        let mut data = table(serde_json::json!([{"a": "n/a", "b": null}, {"a": 1}]));
        add_statistic_column(&mut data, "m", &names(&["a", "b"]), RowFunction::Mean, None);
        assert_eq!(
            json_rows(&data),
            serde_json::json!([{"a": "n/a", "b": null}, {"a": 1, "m": 1}])
        );
    }

    #[test]
    fn decimal_rendering_rounds_or_formats() {
        let mut data = table(serde_json::json!([{"a": 1, "b": 2}]));
        add_statistic_column(&mut data, "round", &names(&["a", "b"]), RowFunction::Mean, Some(0));
        add_statistic_column(&mut data, "fixed", &names(&["a", "b"]), RowFunction::Mean, Some(2));
        add_statistic_column(&mut data, "raw", &names(&["a", "b"]), RowFunction::Mean, None);
        assert_eq!(data[0]["round"], Value::Integer(2));
        assert_eq!(data[0]["fixed"], Value::Str("1.50".into()));
        assert_eq!(data[0]["raw"], Value::Number(1.5));
    }

    #[test]
    fn order_based_functions_use_raw_values() {
        let mut data = table(serde_json::json!([{"a": "x", "b": "y", "c": "x"}]));
        let cols = names(&["a", "b", "c"]);
        let mut rng = StdRng::seed_from_u64(1);
        add_statistic_column_with_rng(&mut data, "first", &cols, RowFunction::First, None, &mut rng);
        add_statistic_column_with_rng(&mut data, "mode", &cols, RowFunction::Mode, None, &mut rng);
        add_statistic_column_with_rng(&mut data, "cat", &cols, RowFunction::Concatenate, None, &mut rng);
        assert_eq!(data[0]["first"], Value::Str("x".into()));
        assert_eq!(data[0]["mode"], Value::Str("x".into()));
        assert_eq!(data[0]["cat"], Value::Str("x y x".into()));
    }

    #[test]
    fn formula_column_skips_rows_missing_a_variable() {
        let mut data = table(serde_json::json!([
            {"price": 10, "qty": 3},
            {"price": 10},
            {"price": "ten", "qty": 3}
        ]));
        add_formula_column(&mut data, "total", "price * qty", None).unwrap();
        assert_eq!(
            json_rows(&data),
            serde_json::json!([
                {"price": 10, "qty": 3, "total": 30},
                {"price": 10},
                {"price": "ten", "qty": 3}
            ])
        );
    }

    #[test]
    fn formula_parse_errors_surface_before_any_mutation() {
        let mut data = table(serde_json::json!([{"a": 1}]));
        assert!(add_formula_column(&mut data, "x", "a +", None).is_err());
        assert_eq!(json_rows(&data), serde_json::json!([{"a": 1}]));
    }
}
