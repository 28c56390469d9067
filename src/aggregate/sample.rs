//! Sampling aggregations: random element and modal value.
//!
//! Both take the random source as an argument so callers can seed it and
//! keep results reproducible under test.

use crate::types::Value;
use indexmap::IndexMap;
use rand::Rng;

/// A uniformly random element; a single-element input returns that element.
pub fn random_value<'a, R: Rng + ?Sized>(values: &'a [Value], rng: &mut R) -> Option<&'a Value> {
    match values.len() {
        0 => None,
        1 => Some(&values[0]),
        n => Some(&values[rng.gen_range(0..n)]),
    }
}

/// All values with maximal frequency, in first-appearance order.
pub fn modes(values: &[Value]) -> Vec<Value> {
    let mut counts: IndexMap<&Value, usize> = IndexMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    let max = counts.values().copied().max().unwrap_or(0);
    counts
        .into_iter()
        .filter(|&(_, count)| count == max)
        .map(|(value, _)| value.clone())
        .collect()
}

/// A modal value; ties are broken uniformly at random.
pub fn mode<R: Rng + ?Sized>(values: &[Value], rng: &mut R) -> Option<Value> {
    let tied = modes(values);
    random_value(&tied, rng).cloned()
}
