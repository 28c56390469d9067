//! Sort-merge join of two tables on a composite key
//!
//! The right table is copied and sorted once by its join-key tuple; every
//! left row then binary-searches the sorted copy and scans the equal run,
//! so probing costs O(L log R + M) after the O(R log R) sort.

use crate::error::{Error, Result};
use crate::infer::infer_schema;
use crate::types::{Record, Schema, Table, Value};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// One matching pair: the left column joined against the right column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMatch {
    pub left: String,
    pub right: String,
}

/// What to do with rows that find no partner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnmatchedPolicy {
    /// Keep unmatched left rows (right columns absent).
    LeftOnly,
    /// Keep unmatched left rows, and append each unmatched right row once.
    Both,
    /// Drop unmatched rows from both sides.
    Inner,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JoinOptions {
    #[serde(rename = "rowMatching")]
    pub row_matching: Vec<ColumnMatch>,
    #[serde(rename = "unmatchedPolicy")]
    pub unmatched_policy: UnmatchedPolicy,
}

/// Join `left` and `right` on the matching columns.
///
/// The result carries all left columns plus the right columns that are not
/// join keys; a right column colliding with a result column is renamed with
/// a sequential suffix. Missing schemas are inferred. Join-key columns
/// absent from their schema are a configuration error, rejected before any
/// output is produced.
pub fn join(
    left: &Table,
    right: &Table,
    left_schema: Option<&Schema>,
    right_schema: Option<&Schema>,
    options: &JoinOptions,
) -> Result<(Table, Schema)> {
    let left_schema = match left_schema {
        Some(schema) => schema.clone(),
        None => infer_schema(left),
    };
    let right_schema = match right_schema {
        Some(schema) => schema.clone(),
        None => infer_schema(right),
    };

    for matching in &options.row_matching {
        if !left_schema.contains_key(&matching.left) {
            return Err(Error::ColumnNotFound(matching.left.clone()));
        }
        if !right_schema.contains_key(&matching.right) {
            return Err(Error::ColumnNotFound(matching.right.clone()));
        }
    }
    debug!(
        left_rows = left.len(),
        right_rows = right.len(),
        keys = options.row_matching.len(),
        "joining tables"
    );

    // Result schema: left columns verbatim, right non-key columns renamed
    // on collision with a sequential suffix.
    let mut schema = left_schema.clone();
    let right_keys: Vec<&str> = options.row_matching.iter().map(|m| m.right.as_str()).collect();
    let mut right_names: Vec<Option<String>> = Vec::with_capacity(right_schema.len());
    for (name, attr) in &right_schema {
        if right_keys.contains(&name.as_str()) {
            right_names.push(None);
            continue;
        }
        let out_name = disambiguate(&schema, name);
        schema.insert(out_name.clone(), attr.clone());
        right_names.push(Some(out_name));
    }

    // Sorted copy of the right table, original indices retained so that
    // unmatched right rows can be reported in right-table order.
    let mut right_sorted: Vec<(usize, &Record)> = right.iter().enumerate().collect();
    right_sorted.sort_by(|(_, a), (_, b)| compare_right_key(a, b, &options.row_matching));

    let mut right_matched = vec![false; right_sorted.len()];
    let mut result = Table::new();

    for left_row in left {
        let key: Vec<&Value> = options
            .row_matching
            .iter()
            .map(|m| left_row.get(&m.left).unwrap_or(&Value::Null))
            .collect();
        let run_start = lower_bound(&right_sorted, &key, &options.row_matching);
        let mut matched = false;

        for idx in run_start..right_sorted.len() {
            let (_, right_row) = right_sorted[idx];
            if compare_key_to_row(&key, right_row, &options.row_matching) != Ordering::Equal {
                break;
            }
            matched = true;
            right_matched[idx] = true;
            let mut out = left_row.clone();
            extend_with_right(&mut out, right_row, &right_schema, &right_names);
            result.push(out);
        }

        if !matched && options.unmatched_policy != UnmatchedPolicy::Inner {
            result.push(left_row.clone());
        }
    }

    if options.unmatched_policy == UnmatchedPolicy::Both {
        let mut unmatched: Vec<(usize, &Record)> = right_sorted
            .iter()
            .zip(&right_matched)
            .filter(|(_, &matched)| !matched)
            .map(|(&(orig, row), _)| (orig, row))
            .collect();
        unmatched.sort_by_key(|&(orig, _)| orig);
        for (_, right_row) in unmatched {
            let mut out = Record::new();
            extend_with_right(&mut out, right_row, &right_schema, &right_names);
            result.push(out);
        }
    }

    Ok((result, schema))
}

/// First free name among `name`, `name_2`, `name_3`, …
fn disambiguate(schema: &Schema, name: &str) -> String {
    if !schema.contains_key(name) {
        return name.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{name}_{n}");
        if !schema.contains_key(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn extend_with_right(
    out: &mut Record,
    right_row: &Record,
    right_schema: &Schema,
    right_names: &[Option<String>],
) {
    for (column, out_name) in right_schema.keys().zip(right_names) {
        let Some(out_name) = out_name else { continue };
        if let Some(value) = right_row.get(column) {
            out.insert(out_name.clone(), value.clone());
        }
    }
}

/// Lexicographic comparison of two right rows by the right key columns.
fn compare_right_key(a: &Record, b: &Record, matching: &[ColumnMatch]) -> Ordering {
    for m in matching {
        let av = a.get(&m.right).unwrap_or(&Value::Null);
        let bv = b.get(&m.right).unwrap_or(&Value::Null);
        match av.cmp(bv) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Compare a left composite key against a right row.
fn compare_key_to_row(key: &[&Value], row: &Record, matching: &[ColumnMatch]) -> Ordering {
    for (kv, m) in key.iter().zip(matching) {
        let rv = row.get(&m.right).unwrap_or(&Value::Null);
        match (*kv).cmp(rv) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Index of the first sorted-right row whose key is >= the probe key.
fn lower_bound(
    right_sorted: &[(usize, &Record)],
    key: &[&Value],
    matching: &[ColumnMatch],
) -> usize {
    right_sorted
        .partition_point(|(_, row)| compare_key_to_row(key, row, matching) == Ordering::Greater)
}
