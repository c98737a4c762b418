//! Structural codec for loosely typed records.
//!
//! Accepts any well-named field with any JSON value, optionally requiring a
//! set of top-level fields on create.

use crate::codec::{CodecError, RecordCodec};
use crate::model::document::{is_reserved_field, is_valid_field_name, Document, Fields, Resource};
use crate::model::update::PartialUpdate;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct DynamicCodec {
    required: BTreeSet<String>,
}

impl DynamicCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `field` to be present and non-null on create.
    pub fn require(mut self, field: impl Into<String>) -> Self {
        self.required.insert(field.into());
        self
    }
}

impl RecordCodec for DynamicCodec {
    fn validate_new(&self, fields: &Fields) -> Result<(), CodecError> {
        for name in fields.keys() {
            check_name(name)?;
        }
        for name in &self.required {
            match fields.get(name) {
                None => return Err(CodecError::MissingField(name.clone())),
                Some(value) if value.is_null() => {
                    return Err(CodecError::NullNotAllowed(name.clone()))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn validate_update(&self, update: &PartialUpdate) -> Result<(), CodecError> {
        for (name, value) in update.fields() {
            check_name(name)?;
            if value.is_null() && self.required.contains(name) {
                return Err(CodecError::NullNotAllowed(name.clone()));
            }
        }
        Ok(())
    }

    fn decode(&self, document: Document) -> Result<Resource, CodecError> {
        Ok(Resource::from(document))
    }
}

fn check_name(name: &str) -> Result<(), CodecError> {
    if is_reserved_field(name) {
        return Err(CodecError::ReservedField(name.to_string()));
    }
    if !is_valid_field_name(name) {
        return Err(CodecError::InvalidFieldName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::DynamicCodec;
    use crate::codec::{CodecError, RecordCodec};
    use crate::model::update::PartialUpdate;
    use serde_json::json;

    #[test]
    fn required_fields_are_enforced_on_create_only() {
        let codec = DynamicCodec::new().require("name");
        let payload = json!({"qty": 5}).as_object().cloned().unwrap();
        assert_eq!(
            codec.validate_new(&payload),
            Err(CodecError::MissingField("name".to_string()))
        );

        let update = PartialUpdate::new().set("qty", 6);
        assert_eq!(codec.validate_update(&update), Ok(()));

        let nulling = PartialUpdate::new().set("name", serde_json::Value::Null);
        assert_eq!(
            codec.validate_update(&nulling),
            Err(CodecError::NullNotAllowed("name".to_string()))
        );
    }

    #[test]
    fn operator_and_path_names_are_rejected() {
        let codec = DynamicCodec::new();
        let update = PartialUpdate::new().set("$set", json!({"a": 1}));
        assert_eq!(
            codec.validate_update(&update),
            Err(CodecError::InvalidFieldName("$set".to_string()))
        );
    }
}
