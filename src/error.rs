//! Error types for the tabular transform engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Configuration problems are rejected up front, before a transform produces
/// any output. Bad data values are never an error: they are skipped by
/// policy, and an empty aggregation input simply omits the output column.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Column {column} must be of type {expected}, found {found}")]
    ColumnTypeMismatch {
        column: String,
        expected: String,
        found: String,
    },

    #[error("Unknown aggregation function: {0}")]
    UnknownAggregation(String),

    #[error("Unknown date granularity: {0}")]
    UnknownGranularity(String),

    #[error("Formula parse error: {0}")]
    FormulaParse(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
