//! Numeric aggregations over parse-coerced inputs.

/// Arithmetic sum.
pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Arithmetic mean. Callers guarantee a non-empty input.
pub fn mean(values: &[f64]) -> f64 {
    sum(values) / values.len() as f64
}

/// Sample variance with divisor `n - 1`.
///
/// Undefined for fewer than two values: a single observation carries no
/// spread information, so the result is `None` rather than a silent zero.
pub fn variance(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let m = mean(values);
    let sq_sum: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some(sq_sum / (n - 1) as f64)
}

/// Square root of the sample variance.
pub fn standard_deviation(values: &[f64]) -> Option<f64> {
    variance(values).map(f64::sqrt)
}

/// Linear-scan minimum.
pub fn min_value(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

/// Linear-scan maximum.
pub fn max_value(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Max minus min.
pub fn range(values: &[f64]) -> f64 {
    max_value(values) - min_value(values)
}
