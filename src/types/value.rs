//! JSON-like values and records
//!
//! Tables are ordered sequences of records; records map column names to
//! values. Column order is first-appearance order and is meaningful, so
//! records and schemas use insertion-ordered maps.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// One row of a table.
pub type Record = IndexMap<String, Value>;

/// An ordered sequence of records.
pub type Table = Vec<Record>;

/// Well-known identity field on object-valued sub-records, used for
/// deduplication during flattening (OGC SensorThings-style sources).
pub const SELF_LINK: &str = "@iot.selfLink";

/// A JSON-compatible value.
///
/// Serialization is untagged, so a `Table` round-trips through ordinary
/// JSON arrays of objects. Deep copy is `Clone`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Number(f64),
    Str(String),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
}

/// The classification of a value, as recorded in a schema.
///
/// `Undefined` stands for a key that is absent from a record; it never
/// occurs as a `Value` but participates in type widening.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    #[serde(rename = "undefined")]
    Undefined,
    #[serde(rename = "null")]
    Null,
    #[serde(rename = "boolean")]
    Bool,
    #[serde(rename = "integer")]
    Integer,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "string")]
    Str,
    #[serde(rename = "array")]
    Array,
    #[serde(rename = "object")]
    Object,
}

impl ValueKind {
    /// Widen this kind with another observation of the same column.
    ///
    /// The widening lattice is the chain
    /// `undefined < null < boolean < integer < number < string < array < object`,
    /// so widening is `max` and therefore commutative: scanning records in
    /// any order yields the same column type.
    pub fn widen(self, other: ValueKind) -> ValueKind {
        self.max(other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Undefined => "undefined",
            ValueKind::Null => "null",
            ValueKind::Bool => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Number => "number",
            ValueKind::Str => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The classification of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Integer(_) => ValueKind::Integer,
            Value::Number(_) => ValueKind::Number,
            Value::Str(_) => ValueKind::Str,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    /// Numeric coercion used by the aggregation library: integers and
    /// numbers convert directly, strings are parsed. Unparsable or
    /// non-numeric values return `None` and are skipped by callers.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Number(n) => Some(*n),
            Value::Str(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Whether the value counts as defined for `CountDefined` and friends:
    /// anything but null and the empty string.
    pub fn is_defined(&self) -> bool {
        !matches!(self, Value::Null) && !matches!(self, Value::Str(s) if s.is_empty())
    }

    /// Plain-text rendering for concatenation: strings without quotes,
    /// numbers and booleans in their natural form, containers as JSON.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => "null".into(),
            Value::Bool(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Str(s) => s.clone(),
            Value::Array(_) | Value::Object(_) => {
                serde_json::to_string(self).unwrap_or_default()
            }
        }
    }

    /// A computed number in its natural JSON form: integral results become
    /// integers, everything else stays a float. Mirrors the untyped numbers
    /// of the source format.
    pub fn canonical_number(n: f64) -> Value {
        const MAX_EXACT: f64 = 9_007_199_254_740_992.0; // 2^53
        if n.is_finite() && n.fract() == 0.0 && n.abs() < MAX_EXACT {
            Value::Integer(n as i64)
        } else {
            Value::Number(n)
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Integer(_) | Value::Number(_) => 2,
            Value::Str(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Integer(i) => write!(f, "Integer({})", i),
            Value::Number(n) => write!(f, "Number({})", n),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Array(items) => f.debug_list().entries(items).finish(),
            Value::Object(map) => f.debug_map().entries(map.iter()).finish(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl Eq for Value {}

/// Natural ordering of underlying scalar values, total across kinds so that
/// sort keys are deterministic: null first, then booleans, numbers (integer
/// and float compared numerically), strings, arrays, objects.
impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => a.cmp(b),
            (a, b) if a.kind_rank() == 2 && b.kind_rank() == 2 => {
                let (a, b) = (a.as_number().unwrap_or(f64::NAN), b.as_number().unwrap_or(f64::NAN));
                a.partial_cmp(&b).unwrap_or(Ordering::Equal)
            }
            (Value::Object(a), Value::Object(b)) => {
                let mut a_pairs: Vec<_> = a.iter().collect();
                let mut b_pairs: Vec<_> = b.iter().collect();
                a_pairs.sort_by_key(|(k, _)| k.as_str());
                b_pairs.sort_by_key(|(k, _)| k.as_str());
                a_pairs.cmp(&b_pairs)
            }
            (a, b) => a.kind_rank().cmp(&b.kind_rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Value::Null => 0u8.hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Number(n) => n.to_bits().hash(state),
            Value::Str(s) => s.hash(state),
            Value::Array(items) => items.hash(state),
            Value::Object(map) => {
                // Hash pairs in sorted key order for determinism
                let mut pairs: Vec<_> = map.iter().collect();
                pairs.sort_by_key(|(k, _)| k.as_str());
                for (k, v) in pairs {
                    k.hash(state);
                    v.hash(state);
                }
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}
