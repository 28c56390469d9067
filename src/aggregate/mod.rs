//! Aggregation function library
//!
//! Pure value-sequence to scalar functions used by the group-by engine and
//! the derived-column builders. Functions are addressed through the
//! [`Aggregation`] enum; wire names are validated eagerly at
//! configuration-parse time instead of being dispatched by string at
//! execution time.
//!
//! Filtering contract: the caller removes null and absent values before
//! calling (and empty strings, for numeric functions). Numeric functions
//! additionally coerce string inputs via numeric parse, silently skipping
//! unparsable entries.

use crate::error::{Error, Result};
use crate::types::Value;
use serde::{Deserialize, Serialize};

mod quartile;
mod sample;
mod stats;

pub use quartile::{median, q1, q3};
pub use sample::{mode, modes, random_value};
pub use stats::{max_value, mean, min_value, range, standard_deviation, sum, variance};

/// The aggregation functions available to `GroupByParams`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Aggregation {
    Count,
    CountDefined,
    ProportionDefined,
    FirstValue,
    LastValue,
    RandomValue,
    Sum,
    Mean,
    Variance,
    StandardDeviation,
    MinValue,
    MaxValue,
    Range,
    Median,
    Q1,
    Q3,
    Mode,
    Concatenate,
}

impl Aggregation {
    pub const ALL: [Aggregation; 18] = [
        Aggregation::Count,
        Aggregation::CountDefined,
        Aggregation::ProportionDefined,
        Aggregation::FirstValue,
        Aggregation::LastValue,
        Aggregation::RandomValue,
        Aggregation::Sum,
        Aggregation::Mean,
        Aggregation::Variance,
        Aggregation::StandardDeviation,
        Aggregation::MinValue,
        Aggregation::MaxValue,
        Aggregation::Range,
        Aggregation::Median,
        Aggregation::Q1,
        Aggregation::Q3,
        Aggregation::Mode,
        Aggregation::Concatenate,
    ];

    /// Look up an aggregation by its wire name, rejecting unknown names.
    pub fn parse(name: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|agg| agg.as_str() == name)
            .ok_or_else(|| Error::UnknownAggregation(name.to_string()))
    }

    /// The wire name, also used as the output column suffix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Count => "Count",
            Aggregation::CountDefined => "CountDefined",
            Aggregation::ProportionDefined => "ProportionDefined",
            Aggregation::FirstValue => "FirstValue",
            Aggregation::LastValue => "LastValue",
            Aggregation::RandomValue => "RandomValue",
            Aggregation::Sum => "Sum",
            Aggregation::Mean => "Mean",
            Aggregation::Variance => "Variance",
            Aggregation::StandardDeviation => "StandardDeviation",
            Aggregation::MinValue => "MinValue",
            Aggregation::MaxValue => "MaxValue",
            Aggregation::Range => "Range",
            Aggregation::Median => "Median",
            Aggregation::Q1 => "Q1",
            Aggregation::Q3 => "Q3",
            Aggregation::Mode => "Mode",
            Aggregation::Concatenate => "Concatenate",
        }
    }

    /// Whether this function consumes parse-coerced numbers (as opposed to
    /// raw values in natural order, run positions or counts).
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Aggregation::Sum
                | Aggregation::Mean
                | Aggregation::Variance
                | Aggregation::StandardDeviation
                | Aggregation::MinValue
                | Aggregation::MaxValue
                | Aggregation::Range
        )
    }
}

impl std::fmt::Display for Aggregation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Aggregation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Join the values' plain-text renderings with a single space, no trailer.
pub fn concatenate(values: &[Value]) -> String {
    values
        .iter()
        .map(Value::to_text)
        .collect::<Vec<_>>()
        .join(" ")
}
