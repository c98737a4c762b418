//! Resource (API-facing) and Document (stored) representations.
//!
//! # Responsibility
//! - Define the two shapes one record takes on either side of the store.
//! - Own the field-name rule shared by codecs, filters and updates.
//!
//! # Invariants
//! - A Document has exactly one `ObjectId`, assigned by the store at insert.
//! - Bodies never carry identifier keys; the id lives beside the body.

use crate::model::object_id::ObjectId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ordered field map used for bodies, payloads and update values.
pub type Fields = Map<String, Value>;

/// Public identifier key on a Resource.
pub const PUBLIC_ID_FIELD: &str = "id";
/// Internal identifier key used by document-store payloads.
pub const INTERNAL_ID_FIELD: &str = "_id";

static FIELD_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("valid field name regex"));

/// Returns whether `name` is an identifier key that callers may not write.
pub fn is_reserved_field(name: &str) -> bool {
    name == PUBLIC_ID_FIELD || name == INTERNAL_ID_FIELD
}

/// Returns whether `name` is usable as a top-level document field.
///
/// Dotted paths and `$`-prefixed operator names never match, so a field name
/// always maps to exactly one top-level key in the stored body.
pub fn is_valid_field_name(name: &str) -> bool {
    !is_reserved_field(name) && FIELD_NAME_RE.is_match(name)
}

/// Stored form of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: ObjectId,
    pub body: Fields,
}

/// API-facing form of a record, serialized as `{"id": "<hex>", ...fields}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ObjectId,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Resource {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Converts into a typed model, e.g. `Profile`.
    pub fn into_model<M: DeserializeOwned>(self) -> Result<M, serde_json::Error> {
        serde_json::from_value(Value::Object(self.into_json_object()))
    }

    /// Flattens into one JSON object carrying the public id.
    pub fn into_json_object(self) -> Fields {
        let mut object = Fields::new();
        object.insert(PUBLIC_ID_FIELD.to_string(), Value::String(self.id.to_hex()));
        object.extend(self.fields);
        object
    }
}

impl From<Document> for Resource {
    fn from(document: Document) -> Self {
        Self {
            id: document.id,
            fields: document.body,
        }
    }
}
