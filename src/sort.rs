//! Sorting helpers
//!
//! Ascending natural-order sorts over tables and value lists, plus the
//! numbers-before-text ordering used for categorical axes.

use crate::types::{Table, Value};

/// Stable ascending sort of `table` by one column; records without the
/// column sort first, as null.
pub fn sort_by_column(table: &mut Table, column: &str) {
    table.sort_by(|a, b| {
        let av = a.get(column).unwrap_or(&Value::Null);
        let bv = b.get(column).unwrap_or(&Value::Null);
        av.cmp(bv)
    });
}

/// Ascending natural-order sort of a value list.
pub fn sort_values(values: &mut [Value]) {
    values.sort();
}

/// Blanks dropped, numerically-parsable values sorted numerically first,
/// remaining values sorted as text after them. Parsable entries come back
/// as numbers regardless of their input form.
pub fn sort_numbers_then_text(values: &[Value]) -> Vec<Value> {
    let mut numbers = Vec::new();
    let mut text = Vec::new();
    for value in values {
        if !value.is_defined() {
            continue;
        }
        match value.as_number() {
            Some(n) => numbers.push(n),
            None => text.push(value.to_text()),
        }
    }
    numbers.sort_by(f64::total_cmp);
    text.sort();
    numbers
        .into_iter()
        .map(Value::canonical_number)
        .chain(text.into_iter().map(Value::Str))
        .collect()
}
