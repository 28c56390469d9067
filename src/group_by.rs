//! Group-by aggregation
//!
//! Partitions rows into groups over a composite key (optionally including a
//! truncated date column) and computes one aggregated column per declared
//! (column, function) pair. The projection is stably sorted, so row order
//! within a group matches input order and ties never reorder.

use crate::aggregate::{self, Aggregation};
use crate::error::{Error, Result};
use crate::infer::infer_schema;
use crate::types::{Record, Schema, Table, Value};
use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// Precision level for date-based grouping. Grouping truncates the ISO-8601
/// string value to a fixed prefix length.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateGranularity {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl DateGranularity {
    /// Prefix length of `YYYY-MM-DDTHH:MM:SS` covered by this granularity.
    pub fn prefix_len(&self) -> usize {
        match self {
            DateGranularity::Year => 4,
            DateGranularity::Month => 7,
            DateGranularity::Day => 10,
            DateGranularity::Hour => 13,
            DateGranularity::Minute => 16,
            DateGranularity::Second => 19,
        }
    }

    /// Case-insensitive lookup, rejecting unknown names.
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "year" => Ok(DateGranularity::Year),
            "month" => Ok(DateGranularity::Month),
            "day" => Ok(DateGranularity::Day),
            "hour" => Ok(DateGranularity::Hour),
            "minute" => Ok(DateGranularity::Minute),
            "second" => Ok(DateGranularity::Second),
            _ => Err(Error::UnknownGranularity(name.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupByParams {
    /// Columns whose values must be equal for rows to share a group.
    #[serde(rename = "groupByAttr")]
    pub group_by_attr: Vec<String>,
    /// Optional date grouping: granularity and the date column.
    #[serde(rename = "groupByDate", default)]
    pub group_by_date: Option<(DateGranularity, String)>,
    /// Aggregated column names mapped to the functions to compute.
    #[serde(rename = "aggregationAttr")]
    pub aggregation_attr: IndexMap<String, Vec<Aggregation>>,
}

/// Group `table` and aggregate, with ambient randomness for `RandomValue`
/// and `Mode` tie-breaks.
pub fn group_by(
    table: &Table,
    schema: Option<&Schema>,
    params: &GroupByParams,
) -> Result<(Table, Schema)> {
    group_by_with_rng(table, schema, params, &mut rand::thread_rng())
}

/// Group `table` and aggregate with a caller-supplied random source, so
/// sampling aggregations are reproducible under test.
pub fn group_by_with_rng<R: Rng + ?Sized>(
    table: &Table,
    schema: Option<&Schema>,
    params: &GroupByParams,
    rng: &mut R,
) -> Result<(Table, Schema)> {
    let attrs = match schema {
        Some(schema) => schema.clone(),
        None => infer_schema(table),
    };

    // Group and date columns must exist; aggregation entries naming unknown
    // columns are ignored, like any other column the data does not have.
    for name in &params.group_by_attr {
        if !attrs.contains_key(name) {
            return Err(Error::ColumnNotFound(name.clone()));
        }
    }
    if let Some((_, date_column)) = &params.group_by_date {
        if !attrs.contains_key(date_column) {
            return Err(Error::ColumnNotFound(date_column.clone()));
        }
    }
    debug!(
        rows = table.len(),
        keys = params.group_by_attr.len(),
        dated = params.group_by_date.is_some(),
        "grouping table"
    );

    let mut key_columns: Vec<&str> = params.group_by_attr.iter().map(String::as_str).collect();
    if let Some((_, date_column)) = &params.group_by_date {
        key_columns.push(date_column);
    }

    // Output schema: key columns verbatim, then one column per declared
    // (column, function) pair, both in source-schema order.
    let mut out_schema = Schema::new();
    for (name, attr) in &attrs {
        if key_columns.contains(&name.as_str()) {
            out_schema.insert(name.clone(), attr.clone());
        }
    }
    for (name, attr) in &attrs {
        if let Some(functions) = params.aggregation_attr.get(name) {
            for function in functions {
                out_schema.insert(format!("{name}_{function}"), attr.clone());
            }
        }
    }

    let projected = project(table, &attrs, params);

    // Stable sort by the composite key; equal keys keep input order.
    let mut sorted: Vec<&Record> = projected.iter().collect();
    sorted.sort_by(|a, b| compare_keys(a, b, &key_columns));

    let mut result = Table::new();
    let mut run_start = 0;
    for i in 1..=sorted.len() {
        if i == sorted.len() || compare_keys(sorted[run_start], sorted[i], &key_columns) != Ordering::Equal {
            result.push(aggregate_run(&sorted[run_start..i], &attrs, params, &key_columns, rng));
            run_start = i;
        }
    }

    Ok((result, out_schema))
}

/// Retain only the columns grouping or aggregation needs, truncating the
/// date column to the granularity prefix.
fn project(table: &Table, attrs: &Schema, params: &GroupByParams) -> Vec<Record> {
    let date = params
        .group_by_date
        .as_ref()
        .map(|(granularity, column)| (granularity.prefix_len(), column.as_str()));
    table
        .iter()
        .map(|record| {
            let mut row = Record::new();
            for name in attrs.keys() {
                if params.group_by_attr.contains(name)
                    || params.aggregation_attr.contains_key(name)
                {
                    if let Some(value) = record.get(name) {
                        row.insert(name.clone(), value.clone());
                    }
                }
            }
            if let Some((prefix_len, column)) = date {
                match record.get(column) {
                    Some(Value::Str(s)) => {
                        let truncated: String = s.chars().take(prefix_len).collect();
                        row.insert(column.to_string(), Value::Str(truncated));
                    }
                    Some(value) => {
                        row.insert(column.to_string(), value.clone());
                    }
                    None => {}
                }
            }
            row
        })
        .collect()
}

fn compare_keys(a: &Record, b: &Record, key_columns: &[&str]) -> Ordering {
    for column in key_columns {
        let av = a.get(*column).unwrap_or(&Value::Null);
        let bv = b.get(*column).unwrap_or(&Value::Null);
        match av.cmp(bv) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// One output record for a maximal run of equal-key rows.
fn aggregate_run<R: Rng + ?Sized>(
    run: &[&Record],
    attrs: &Schema,
    params: &GroupByParams,
    key_columns: &[&str],
    rng: &mut R,
) -> Record {
    let mut out = Record::new();
    for name in attrs.keys() {
        if key_columns.contains(&name.as_str()) {
            if let Some(value) = run[0].get(name) {
                out.insert(name.clone(), value.clone());
            }
        }
    }

    for name in attrs.keys() {
        let Some(functions) = params.aggregation_attr.get(name) else { continue };

        // Filtered views of the run for this column, computed on demand.
        let mut raw_values: Option<Vec<Value>> = None;
        let mut numbers: Option<Vec<f64>> = None;
        let mut defined: Option<usize> = None;

        for function in functions {
            let column = format!("{name}_{function}");
            let value = match function {
                Aggregation::Count => Some(Value::Integer(run.len() as i64)),
                Aggregation::FirstValue => run[0].get(name).cloned(),
                Aggregation::LastValue => run[run.len() - 1].get(name).cloned(),
                Aggregation::RandomValue => {
                    let row = if run.len() == 1 { 0 } else { rng.gen_range(0..run.len()) };
                    run[row].get(name).cloned()
                }
                Aggregation::CountDefined => {
                    let count = *defined.get_or_insert_with(|| count_defined(run, name));
                    Some(Value::Integer(count as i64))
                }
                Aggregation::ProportionDefined => {
                    let count = *defined.get_or_insert_with(|| count_defined(run, name));
                    Some(Value::canonical_number(count as f64 / run.len() as f64 * 100.0))
                }
                Aggregation::Concatenate => {
                    let values = raw_values.get_or_insert_with(|| collect_values(run, name));
                    Some(Value::Str(aggregate::concatenate(values)))
                }
                Aggregation::Mode => {
                    let values = raw_values.get_or_insert_with(|| collect_values(run, name));
                    aggregate::mode(values, rng)
                }
                Aggregation::Median => {
                    let values = raw_values.get_or_insert_with(|| collect_values(run, name));
                    aggregate::median(values)
                }
                Aggregation::Q1 => {
                    let values = raw_values.get_or_insert_with(|| collect_values(run, name));
                    aggregate::q1(values)
                }
                Aggregation::Q3 => {
                    let values = raw_values.get_or_insert_with(|| collect_values(run, name));
                    aggregate::q3(values)
                }
                numeric => {
                    let values = numbers.get_or_insert_with(|| collect_numbers(run, name));
                    if values.is_empty() {
                        None
                    } else {
                        match numeric {
                            Aggregation::Sum => Some(Value::canonical_number(aggregate::sum(values))),
                            Aggregation::Mean => Some(Value::canonical_number(aggregate::mean(values))),
                            Aggregation::Variance => {
                                aggregate::variance(values).map(Value::canonical_number)
                            }
                            Aggregation::StandardDeviation => {
                                aggregate::standard_deviation(values).map(Value::canonical_number)
                            }
                            Aggregation::MinValue => {
                                Some(Value::canonical_number(aggregate::min_value(values)))
                            }
                            Aggregation::MaxValue => {
                                Some(Value::canonical_number(aggregate::max_value(values)))
                            }
                            Aggregation::Range => Some(Value::canonical_number(aggregate::range(values))),
                            _ => unreachable!("non-numeric aggregations handled above"),
                        }
                    }
                }
            };
            // An empty filtered input omits the column rather than
            // defaulting it.
            if let Some(value) = value {
                out.insert(column, value);
            }
        }
    }
    out
}

fn count_defined(run: &[&Record], column: &str) -> usize {
    run.iter()
        .filter(|record| record.get(column).is_some_and(Value::is_defined))
        .count()
}

/// Present, non-null values of the run, in run order.
fn collect_values(run: &[&Record], column: &str) -> Vec<Value> {
    run.iter()
        .filter_map(|record| record.get(column))
        .filter(|value| !value.is_null())
        .cloned()
        .collect()
}

/// Parse-coerced numbers of the run; empty strings and unparsable values
/// are skipped by policy.
fn collect_numbers(run: &[&Record], column: &str) -> Vec<f64> {
    run.iter()
        .filter_map(|record| record.get(column))
        .filter_map(Value::as_number)
        .collect()
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

    fn params(
        group_by: &[&str],
        aggregations: &[(&str, &[Aggregation])],
    ) -> GroupByParams {
        GroupByParams {
            group_by_attr: group_by.iter().map(|&s| s.to_string()).collect(),
            group_by_date: None,
            aggregation_attr: aggregations
                .iter()
                .map(|&(name, functions)| (name.to_string(), functions.to_vec()))
                .collect(),
        }
    }

    #[test]
    fn groups_in_first_appearance_order_with_sum_and_count() {
        let data = table(serde_json::json!([
            {"g": "x", "v": 1},
            {"g": "x", "v": 3},
            {"g": "y", "v": 10}
        ]));
        let p = params(&["g"], &[("v", &[Aggregation::Sum, Aggregation::Count])]);
        let (rows, schema) = group_by(&data, None, &p).unwrap();
        assert_eq!(
            json_rows(&rows),
            serde_json::json!([
                {"g": "x", "v_Sum": 4, "v_Count": 2},
                {"g": "y", "v_Sum": 10, "v_Count": 1}
            ])
        );
        assert_eq!(
            schema.keys().collect::<Vec<_>>(),
            ["g", "v_Sum", "v_Count"]
        );
    }

    #[test]
    fn row_order_within_a_group_matches_input_order() {
        let data = table(serde_json::json!([
            {"g": 1, "v": "c"},
            {"g": 1, "v": "a"},
            {"g": 1, "v": "b"}
        ]));
        let p = params(
            &["g"],
            &[("v", &[Aggregation::FirstValue, Aggregation::LastValue, Aggregation::Concatenate])],
        );
        let (rows, _) = group_by(&data, None, &p).unwrap();
        assert_eq!(
            json_rows(&rows),
            serde_json::json!([
                {"g": 1, "v_FirstValue": "c", "v_LastValue": "b", "v_Concatenate": "c a b"}
            ])
        );
    }

    #[test]
    fn numeric_functions_coerce_strings_and_skip_junk() {
        let data = table(serde_json::json!([
            {"g": 1, "v": "2"},
            {"g": 1, "v": 4},
            {"g": 1, "v": "n/a"},
            {"g": 1, "v": ""},
            {"g": 1, "v": null}
        ]));
        let p = params(
            &["g"],
            &[("v", &[Aggregation::Sum, Aggregation::Mean, Aggregation::CountDefined, Aggregation::ProportionDefined])],
        );
        let (rows, _) = group_by(&data, None, &p).unwrap();
        assert_eq!(
            json_rows(&rows),
            serde_json::json!([
                {"g": 1, "v_Sum": 6, "v_Mean": 3, "v_CountDefined": 3, "v_ProportionDefined": 60}
            ])
        );
    }

    #[test]
    fn empty_aggregation_input_omits_the_column() {
        let data = table(serde_json::json!([
            {"g": "a", "v": null},
            {"g": "a", "v": ""},
            {"g": "b", "v": 5}
        ]));
        let p = params(&["g"], &[("v", &[Aggregation::Sum, Aggregation::Count])]);
        let (rows, _) = group_by(&data, None, &p).unwrap();
        assert_eq!(
            json_rows(&rows),
            serde_json::json!([
                {"g": "a", "v_Count": 2},
                {"g": "b", "v_Sum": 5, "v_Count": 1}
            ])
        );
    }

    #[test]
    fn variance_of_single_row_group_is_omitted() {
        let data = table(serde_json::json!([
            {"g": "a", "v": 7},
            {"g": "b", "v": 2},
            {"g": "b", "v": 2}
        ]));
        let p = params(&["g"], &[("v", &[Aggregation::Variance])]);
        let (rows, _) = group_by(&data, None, &p).unwrap();
        assert_eq!(
            json_rows(&rows),
            serde_json::json!([
                {"g": "a"},
                {"g": "b", "v_Variance": 0}
            ])
        );
    }

    #[test]
    fn date_grouping_truncates_iso_strings() {
        let data = table(serde_json::json!([
            {"when": "2024-03-05T10:00:00Z", "v": 1},
            {"when": "2024-03-28T11:30:00Z", "v": 2},
            {"when": "2024-04-02T09:15:00Z", "v": 4}
        ]));
        let p = GroupByParams {
            group_by_attr: vec![],
            group_by_date: Some((DateGranularity::Month, "when".into())),
            aggregation_attr: [("v".to_string(), vec![Aggregation::Sum])].into_iter().collect(),
        };
        let (rows, schema) = group_by(&data, None, &p).unwrap();
        assert_eq!(
            json_rows(&rows),
            serde_json::json!([
                {"when": "2024-03", "v_Sum": 3},
                {"when": "2024-04", "v_Sum": 4}
            ])
        );
        assert_eq!(schema.keys().collect::<Vec<_>>(), ["when", "v_Sum"]);
    }

    #[test]
    fn second_granularity_keeps_the_full_timestamp_prefix() {
        assert_eq!(DateGranularity::Second.prefix_len(), 19);
        assert_eq!(DateGranularity::parse("second").unwrap(), DateGranularity::Second);
        assert_eq!(
            DateGranularity::parse("fortnight"),
            Err(Error::UnknownGranularity("fortnight".into()))
        );
    }

    #[test]
    fn missing_group_column_is_rejected_up_front() {
        let data = table(serde_json::json!([{"v": 1}]));
        let p = params(&["nope"], &[("v", &[Aggregation::Sum])]);
        assert_eq!(
            group_by(&data, None, &p).unwrap_err(),
            Error::ColumnNotFound("nope".into())
        );
    }

    #[test]
    fn sampling_aggregations_are_reproducible_with_a_seed() {
        let data = table(serde_json::json!([
            {"g": 1, "v": "a"},
            {"g": 1, "v": "b"}
        ]));
        let p = params(&["g"], &[("v", &[Aggregation::Mode, Aggregation::RandomValue])]);
        let mut rng_a = StdRng::seed_from_u64(99);
        let mut rng_b = StdRng::seed_from_u64(99);
        let (rows_a, _) = group_by_with_rng(&data, None, &p, &mut rng_a).unwrap();
        let (rows_b, _) = group_by_with_rng(&data, None, &p, &mut rng_b).unwrap();
        assert_eq!(rows_a, rows_b);
    }

    #[test]
    fn multi_key_groups_partition_on_every_column() {
        let data = table(serde_json::json!([
            {"a": 1, "b": "x", "v": 1},
            {"a": 1, "b": "y", "v": 2},
            {"a": 1, "b": "x", "v": 3}
        ]));
        let p = params(&["a", "b"], &[("v", &[Aggregation::Sum])]);
        let (rows, _) = group_by(&data, None, &p).unwrap();
        assert_eq!(
            json_rows(&rows),
            serde_json::json!([
                {"a": 1, "b": "x", "v_Sum": 4},
                {"a": 1, "b": "y", "v_Sum": 2}
            ])
        );
    }
}
