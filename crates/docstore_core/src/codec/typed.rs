//! Schema-checked codec for typed models.
//!
//! # Invariants
//! - Creates must satisfy the full `Model::FIELDS` schema.
//! - Updates are checked field by field from the presence mask; the model
//!   type is only materialized on the read path.

use crate::codec::{CodecError, RecordCodec};
use crate::model::document::{is_reserved_field, Document, Fields, Resource};
use crate::model::schema::Model;
use crate::model::update::PartialUpdate;
use serde_json::Value;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;

pub struct TypedCodec<M> {
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> TypedCodec<M> {
    pub fn new() -> Self {
        Self {
            _model: PhantomData,
        }
    }
}

impl<M: Model> Default for TypedCodec<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Clone for TypedCodec<M> {
    fn clone(&self) -> Self {
        Self {
            _model: PhantomData,
        }
    }
}

impl<M> Debug for TypedCodec<M> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedCodec")
            .field("model", &std::any::type_name::<M>())
            .finish()
    }
}

impl<M: Model> RecordCodec for TypedCodec<M> {
    fn validate_new(&self, fields: &Fields) -> Result<(), CodecError> {
        for (name, value) in fields {
            check_field::<M>(name, value)?;
        }
        for spec in M::FIELDS.iter().filter(|spec| spec.required) {
            if !fields.contains_key(spec.name) {
                return Err(CodecError::MissingField(spec.name.to_string()));
            }
        }
        Ok(())
    }

    fn validate_update(&self, update: &PartialUpdate) -> Result<(), CodecError> {
        for (name, value) in update.fields() {
            check_field::<M>(name, value)?;
        }
        Ok(())
    }

    fn decode(&self, document: Document) -> Result<Resource, CodecError> {
        let resource = Resource::from(document);
        let probe = Value::Object(resource.clone().into_json_object());
        serde_json::from_value::<M>(probe)
            .map_err(|err| CodecError::Undecodable(format!("{}: {err}", resource.id)))?;
        Ok(resource)
    }
}

fn check_field<M: Model>(name: &str, value: &Value) -> Result<(), CodecError> {
    if is_reserved_field(name) {
        return Err(CodecError::ReservedField(name.to_string()));
    }
    let spec = M::field(name).ok_or_else(|| CodecError::UnknownField(name.to_string()))?;
    if value.is_null() {
        if spec.required {
            return Err(CodecError::NullNotAllowed(name.to_string()));
        }
        return Ok(());
    }
    if !spec.accepts(value) {
        return Err(CodecError::TypeMismatch {
            field: name.to_string(),
            expected: spec.kind.describe(),
        });
    }
    Ok(())
}
