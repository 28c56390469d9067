//! Schema flattening
//!
//! Decomposes nested object and array fields into flat columns, or fans
//! array fields out into extra records. The output schema is recomputed by
//! the inferencer over the result rows; callers may pin individual columns
//! with a fixed attribute that is copied verbatim.

use crate::infer::infer_schema;
use crate::types::{Record, Schema, Table, Value, SELF_LINK};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Flattening behavior.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlattenOptions {
    /// Fan an array-valued field of length N out into N records instead of
    /// N indexed columns.
    #[serde(default, rename = "arraysAsRecords")]
    pub arrays_as_records: bool,
    /// Before expanding an array, drop elements whose `@iot.selfLink`
    /// equals the parent record's, so a cross-reference back to the record
    /// itself is not represented.
    #[serde(default, rename = "removeAlreadyPresent")]
    pub remove_already_present: bool,
}

/// Flatten nested structures in every record of `table`.
///
/// Row count is unchanged in the default path-flatten mode; with
/// `arrays_as_records` each array field multiplies its record. Attributes
/// in `overrides` replace the inferred ones for their columns.
pub fn flatten(table: &Table, overrides: Option<&Schema>, options: &FlattenOptions) -> (Table, Schema) {
    debug!(
        rows = table.len(),
        arrays_as_records = options.arrays_as_records,
        "flattening table"
    );
    let mut result = Table::new();
    for record in table {
        if options.arrays_as_records {
            result.push(record.clone());
            let mut i = result.len() - 1;
            while i < result.len() {
                fan_out_record(&mut result, i, options.remove_already_present);
                i += 1;
            }
        } else {
            let parent_link = record.get(SELF_LINK).cloned();
            let mut flat = Record::new();
            for (name, value) in record {
                separate_property(
                    &mut flat,
                    parent_link.as_ref(),
                    name,
                    value,
                    options.remove_already_present,
                );
            }
            result.push(flat);
        }
    }

    let inferred = infer_schema(&result);
    let schema = inferred
        .into_iter()
        .map(|(name, attr)| {
            let attr = overrides
                .and_then(|fixed| fixed.get(&name))
                .cloned()
                .unwrap_or(attr);
            (name, attr)
        })
        .collect();
    (result, schema)
}

/// Path-flatten one field into `out`, recursing until all values are
/// scalars: objects contribute `base/subkey` columns, arrays `base_i`,
/// array-of-object elements `base/subkey_i` and nested arrays `base_i_j`.
fn separate_property(
    out: &mut Record,
    parent_link: Option<&Value>,
    base: &str,
    value: &Value,
    remove_already_present: bool,
) {
    match value {
        Value::Object(map) => {
            for (sub, v) in map {
                separate_property(out, parent_link, &format!("{base}/{sub}"), v, remove_already_present);
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                match item {
                    Value::Array(inner) => {
                        for (j, v) in retained(inner, parent_link, remove_already_present).enumerate() {
                            separate_property(
                                out,
                                parent_link,
                                &format!("{base}_{i}_{j}"),
                                v,
                                remove_already_present,
                            );
                        }
                    }
                    Value::Object(map) => {
                        for (sub, v) in map {
                            separate_property(
                                out,
                                parent_link,
                                &format!("{base}/{sub}_{i}"),
                                v,
                                remove_already_present,
                            );
                        }
                    }
                    scalar => {
                        out.insert(format!("{base}_{i}"), scalar.clone());
                    }
                }
            }
        }
        scalar => {
            out.insert(base.to_string(), scalar.clone());
        }
    }
}

/// Array elements minus the ones referring back to the parent record.
fn retained<'a>(
    items: &'a [Value],
    parent_link: Option<&'a Value>,
    remove_already_present: bool,
) -> impl Iterator<Item = &'a Value> {
    items.iter().filter(move |item| {
        !(remove_already_present && refers_to_parent(item, parent_link))
    })
}

fn refers_to_parent(item: &Value, parent_link: Option<&Value>) -> bool {
    match (item, parent_link) {
        (Value::Object(map), Some(link)) => map.get(SELF_LINK) == Some(link),
        _ => false,
    }
}

/// Fan out arrays of the record at `i` into rows inserted immediately
/// after it, and path-split its object fields in place. Inserted rows are
/// processed again by the caller's scan, so nested arrays keep expanding.
fn fan_out_record(rows: &mut Vec<Record>, i: usize, remove_already_present: bool) {
    let mut k = 0;
    while let Some((name, value)) = rows[i].get_index(k) {
        let (name, value) = (name.clone(), value.clone());
        match value {
            Value::Object(map) => {
                // The object column disappears; its leaves append at the
                // end of the record and are scanned later.
                rows[i].shift_remove(&name);
                for (sub, v) in map {
                    rows[i].insert(format!("{name}/{sub}"), v);
                }
            }
            Value::Array(items) => {
                let parent_link = rows[i].get(SELF_LINK).cloned();
                let items: Vec<&Value> =
                    retained(&items, parent_link.as_ref(), remove_already_present).collect();
                if items.is_empty() {
                    rows[i].shift_remove(&name);
                    continue;
                }
                for (j, item) in items.iter().enumerate().skip(1) {
                    let mut copy = rows[i].clone();
                    copy.insert(name.clone(), (*item).clone());
                    rows.insert(i + j, copy);
                }
                rows[i].insert(name.clone(), items[0].clone());
                // Element 0 may itself be nested: reprocess this position.
            }
            _ => k += 1,
        }
    }
}
