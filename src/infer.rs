//! Schema inference
//!
//! Folds per-row type observations into one attribute per column using the
//! widening lattice on [`ValueKind`]. Absence of a key in a record does not
//! affect the widened type, so inference is independent of row order.

use crate::types::{Attribute, Schema, Table};

/// Infer a schema over a table.
///
/// Columns appear in first-appearance order. A column observed only as
/// `null` keeps type `null`.
pub fn infer_schema(table: &Table) -> Schema {
    let mut schema = Schema::new();
    for record in table {
        for (name, value) in record {
            let kind = value.kind();
            match schema.get_mut(name) {
                Some(attr) => attr.kind = attr.kind.widen(kind),
                None => {
                    schema.insert(name.clone(), Attribute::new(kind));
                }
            }
        }
    }
    schema
}
