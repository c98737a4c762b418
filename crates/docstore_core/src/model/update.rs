//! Partial update sets.
//!
//! # Responsibility
//! - Carry exactly the fields a caller asked to change (the presence mask).
//!
//! # Invariants
//! - A field absent from the set is never written by the update path.
//! - Construction never fills absent fields with defaults or nulls.

use crate::model::document::Fields;
use serde::Serialize;
use serde_json::Value;

/// Presence-masked set of field changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialUpdate {
    fields: Fields,
}

impl PartialUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an update from a JSON object. Returns `None` for non-objects.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// Builds an update from a typed patch.
    ///
    /// The patch must skip absent members when serializing
    /// (`#[serde(skip_serializing_if = "Option::is_none")]`); only the members
    /// that survive serialization enter the presence mask.
    pub fn from_patch<P: Serialize>(patch: &P) -> Result<Self, serde_json::Error> {
        match serde_json::to_value(patch)? {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(serde::ser::Error::custom(format!(
                "patch must serialize to an object, got {other}"
            ))),
        }
    }

    /// Adds or replaces one field change.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Names of the fields present in the mask.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::PartialUpdate;
    use serde::Serialize;
    use serde_json::{json, Value};

    #[derive(Serialize, Default)]
    struct Patch {
        #[serde(skip_serializing_if = "Option::is_none")]
        qty: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    }

    #[test]
    fn from_patch_keeps_only_present_members() {
        let update = PartialUpdate::from_patch(&Patch {
            qty: Some(6),
            ..Patch::default()
        })
        .unwrap();

        assert_eq!(update.len(), 1);
        assert!(update.contains("qty"));
        assert!(!update.contains("color"));
    }

    #[test]
    fn from_json_keeps_explicit_null_and_rejects_non_objects() {
        let update = PartialUpdate::from_json(json!({"color": null})).unwrap();
        assert_eq!(update.fields().get("color"), Some(&Value::Null));

        assert!(PartialUpdate::from_json(json!([1, 2])).is_none());
        assert!(PartialUpdate::from_patch(&7).is_err());
    }
}
