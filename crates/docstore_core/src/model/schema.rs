//! Declared schemas for typed models.
//!
//! # Responsibility
//! - Describe a model's fields so values can be checked one field at a time,
//!   without materializing the whole model.
//!
//! # Invariants
//! - `Model::FIELDS` names are unique and satisfy `is_valid_field_name`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

static RFC3339_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})?$")
        .expect("valid datetime regex")
});

/// Value shape accepted by one schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Number,
    Boolean,
    /// RFC 3339 timestamp string; the offset may be omitted.
    DateTime,
    Array(&'static FieldKind),
}

impl FieldKind {
    /// Returns whether `value` has this shape. `null` never matches.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::String, Value::String(_)) => true,
            (Self::Integer, Value::Number(number)) => number.is_i64() || number.is_u64(),
            (Self::Number, Value::Number(_)) => true,
            (Self::Boolean, Value::Bool(_)) => true,
            (Self::DateTime, Value::String(text)) => RFC3339_RE.is_match(text),
            (Self::Array(item), Value::Array(items)) => items.iter().all(|v| item.matches(v)),
            _ => false,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::String => "string".to_string(),
            Self::Integer => "integer".to_string(),
            Self::Number => "number".to_string(),
            Self::Boolean => "boolean".to_string(),
            Self::DateTime => "datetime".to_string(),
            Self::Array(item) => format!("array<{}>", item.describe()),
        }
    }
}

/// One declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Required fields must be present and non-null on create, and can never
    /// be set to null by an update.
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }

    /// Checks one value against this field, allowing `null` for optional fields.
    pub fn accepts(&self, value: &Value) -> bool {
        if value.is_null() {
            return !self.required;
        }
        self.kind.matches(value)
    }
}

/// A typed record stored in one collection.
pub trait Model: Serialize + DeserializeOwned {
    /// Default collection name.
    const COLLECTION: &'static str;
    /// Declared fields, excluding the identifier.
    const FIELDS: &'static [FieldSpec];

    fn field(name: &str) -> Option<&'static FieldSpec> {
        Self::FIELDS.iter().find(|spec| spec.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldKind, FieldSpec};
    use serde_json::json;

    #[test]
    fn kinds_match_expected_values() {
        assert!(FieldKind::Integer.matches(&json!(6)));
        assert!(!FieldKind::Integer.matches(&json!(6.5)));
        assert!(FieldKind::Number.matches(&json!(6.5)));
        assert!(FieldKind::DateTime.matches(&json!("1987-07-19T00:00:00")));
        assert!(FieldKind::DateTime.matches(&json!("1987-07-19T00:00:00.125+02:00")));
        assert!(!FieldKind::DateTime.matches(&json!("19 July 1987")));
        assert!(FieldKind::Array(&FieldKind::Number).matches(&json!([1.5, -2])));
        assert!(!FieldKind::Array(&FieldKind::Number).matches(&json!([1.5, "x"])));
    }

    #[test]
    fn null_only_accepted_for_optional_fields() {
        let required = FieldSpec::required("name", FieldKind::String);
        let optional = FieldSpec::optional("nickname", FieldKind::String);
        assert!(!required.accepts(&json!(null)));
        assert!(optional.accepts(&json!(null)));
        assert_eq!(FieldKind::Array(&FieldKind::String).describe(), "array<string>");
    }
}
