//! Column schemas
//!
//! A schema maps column names to attributes in first-appearance order. The
//! attribute's type is the widened type across every record that contains
//! the column; the optional fields carry semantic metadata inherited from
//! the source format (definitions and units of measurement).

use super::value::ValueKind;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A schema: column name to attribute, in column order.
pub type Schema = IndexMap<String, Attribute>;

/// Description of one column.
///
/// Wire shape: `{type, description?, definition?, UoM?, UoMSymbol?,
/// UoMDefinition?}` with `definition` and `UoMDefinition` holding URIs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub kind: ValueKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(rename = "UoM", skip_serializing_if = "Option::is_none")]
    pub uom: Option<String>,
    #[serde(rename = "UoMSymbol", skip_serializing_if = "Option::is_none")]
    pub uom_symbol: Option<String>,
    #[serde(rename = "UoMDefinition", skip_serializing_if = "Option::is_none")]
    pub uom_definition: Option<String>,
}

impl Attribute {
    /// An attribute with only a type, no metadata.
    pub fn new(kind: ValueKind) -> Self {
        Self {
            kind,
            description: None,
            definition: None,
            uom: None,
            uom_symbol: None,
            uom_definition: None,
        }
    }
}

impl From<ValueKind> for Attribute {
    fn from(kind: ValueKind) -> Self {
        Self::new(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_wire_shape() {
        let mut attr = Attribute::new(ValueKind::Number);
        attr.uom = Some("degree Celsius".into());
        attr.uom_symbol = Some("°C".into());
        let json = serde_json::to_value(&attr).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "number", "UoM": "degree Celsius", "UoMSymbol": "°C"})
        );
        let back: Attribute = serde_json::from_value(json).unwrap();
        assert_eq!(back, attr);
    }
}
