//! In-memory tabular data transformation engine.
//!
//! Tables are ordered lists of JSON-like records with a self-describing
//! schema inferred by type widening. The crate provides the transforms a
//! data-exploration frontend composes: flattening nested structures,
//! splitting delimited columns, joining tables, grouping with a library of
//! aggregation functions, deriving columns from statistics or formulas, and
//! sorting.
//!
//! Transforms that reshape a table take `&Table` and return a fresh
//! `(Table, Schema)`; the column builders in [`derive`] mutate in place.
//! Configuration problems (missing key columns, unknown function names,
//! splitting a non-string column) are rejected before any output exists;
//! bad data values are skipped by policy and never abort a transform.

pub mod aggregate;
pub mod derive;
pub mod error;
pub mod flatten;
pub mod formula;
pub mod group_by;
pub mod infer;
pub mod join;
pub mod sort;
pub mod split;
pub mod types;

pub use aggregate::Aggregation;
pub use error::{Error, Result};
pub use flatten::{flatten, FlattenOptions};
pub use formula::Formula;
pub use group_by::{group_by, group_by_with_rng, DateGranularity, GroupByParams};
pub use infer::infer_schema;
pub use join::{join, ColumnMatch, JoinOptions, UnmatchedPolicy};
pub use sort::{sort_by_column, sort_numbers_then_text, sort_values};
pub use split::{split_column_into_columns, split_column_into_records};
pub use types::{Attribute, Record, Schema, Table, Value, ValueKind, SELF_LINK};
