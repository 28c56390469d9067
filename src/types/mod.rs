//! Core data model: values, records, tables and schemas.

pub mod schema;
pub mod value;

pub use schema::{Attribute, Schema};
pub use value::{Record, Table, Value, ValueKind, SELF_LINK};
