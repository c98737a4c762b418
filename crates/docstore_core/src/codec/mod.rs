//! Record codecs: how payloads are validated and stored documents decoded.
//!
//! # Responsibility
//! - Define the capability the access layer composes with (`RecordCodec`).
//! - Provide the structural (`DynamicCodec`) and schema-checked
//!   (`TypedCodec`) variants.
//!
//! # Invariants
//! - Update validation only ever looks at the presence mask; no codec builds
//!   a full record to validate an update.
//! - Decoding rejects stored bodies the codec cannot represent.

use crate::model::document::{Document, Fields, Resource};
use crate::model::update::PartialUpdate;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod dynamic;
pub mod typed;

pub use dynamic::DynamicCodec;
pub use typed::TypedCodec;

/// Validation or decoding failure raised by a codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    InvalidFieldName(String),
    ReservedField(String),
    UnknownField(String),
    MissingField(String),
    TypeMismatch { field: String, expected: String },
    NullNotAllowed(String),
    EmptyUpdate,
    NotAnObject,
    Undecodable(String),
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFieldName(name) => write!(f, "invalid field name `{name}`"),
            Self::ReservedField(name) => {
                write!(f, "field `{name}` is a server-assigned identifier")
            }
            Self::UnknownField(name) => write!(f, "unknown field `{name}`"),
            Self::MissingField(name) => write!(f, "missing required field `{name}`"),
            Self::TypeMismatch { field, expected } => {
                write!(f, "field `{field}` must be of type {expected}")
            }
            Self::NullNotAllowed(name) => write!(f, "field `{name}` cannot be null"),
            Self::EmptyUpdate => write!(f, "update names no fields"),
            Self::NotAnObject => write!(f, "payload must be a JSON object"),
            Self::Undecodable(message) => write!(f, "stored document does not decode: {message}"),
        }
    }
}

impl Error for CodecError {}

/// Validation and decoding capability for one collection's records.
pub trait RecordCodec {
    /// Checks a create payload. The payload carries no identifier keys.
    fn validate_new(&self, fields: &Fields) -> Result<(), CodecError>;
    /// Checks each field of an update set independently.
    fn validate_update(&self, update: &PartialUpdate) -> Result<(), CodecError>;
    /// Turns a stored document into its API-facing form.
    fn decode(&self, document: Document) -> Result<Resource, CodecError>;
}
