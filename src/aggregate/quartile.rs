//! Median and quartiles
//!
//! All three functions sort a copy of the input by natural value order and
//! pick positions with parity-dependent arithmetic: the median averages the
//! two middle elements for even lengths, and Q1/Q3 are the lower/upper
//! median of each half, recursively applying the same odd/even split.
//!
//! Averaging a middle pair requires both elements to coerce to numbers;
//! otherwise the result is `None` and the caller omits the column. A single
//! middle element is returned as-is, so string-ordered data (such as
//! ISO-8601 timestamps) still has a median for odd lengths.

use crate::types::Value;

/// Average of two positions, if both are numeric.
fn midpoint(a: &Value, b: &Value) -> Option<Value> {
    Some(Value::Number((a.as_number()? + b.as_number()?) / 2.0))
}

fn sorted_copy(values: &[Value]) -> Vec<Value> {
    let mut sorted = values.to_vec();
    sorted.sort();
    sorted
}

/// Middle element for odd lengths, average of the two middles for even.
pub fn median(values: &[Value]) -> Option<Value> {
    let sorted = sorted_copy(values);
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n % 2 == 1 {
        return Some(sorted[n / 2].clone());
    }
    midpoint(&sorted[n / 2 - 1], &sorted[n / 2])
}

/// Average of the 1-based positions `k` and `k + 1`, bounds-checked.
fn pair_at(sorted: &[Value], k: usize) -> Option<Value> {
    midpoint(sorted.get(k.checked_sub(1)?)?, sorted.get(k)?)
}

/// Lower quartile.
pub fn q1(values: &[Value]) -> Option<Value> {
    let sorted = sorted_copy(values);
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n % 2 == 1 {
        let m = (n + 1) / 2;
        if m % 2 == 1 {
            // Odd median position: each half holds an even count.
            return pair_at(&sorted, m - 1 - (m - 1) / 2);
        }
        return Some(sorted[m - m / 2 - 1].clone());
    }
    let m = n / 2;
    if m % 2 == 1 {
        return Some(sorted[m - (m - 1) / 2 - 1].clone());
    }
    pair_at(&sorted, m - m / 2)
}

/// Upper quartile.
pub fn q3(values: &[Value]) -> Option<Value> {
    let sorted = sorted_copy(values);
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n % 2 == 1 {
        let m = (n + 1) / 2;
        if m % 2 == 1 {
            return pair_at(&sorted, m + (m - 1) / 2);
        }
        return Some(sorted[m + m / 2 - 1].clone());
    }
    let m = n / 2;
    if m % 2 == 1 {
        return Some(sorted[m + (m + 1) / 2 - 1].clone());
    }
    pair_at(&sorted, m + m / 2)
}
