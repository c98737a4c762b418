//! Document access service.
//!
//! # Responsibility
//! - Translate between public identifiers and stored documents.
//! - Provide create/get/list/update/delete over one collection.
//!
//! # Invariants
//! - Malformed identifiers and invalid update sets are rejected before any
//!   store call.
//! - Updates touch exactly the fields in the presence mask.
//! - Outcomes are returned, never logged or retried here.

use crate::codec::{CodecError, RecordCodec};
use crate::model::document::{is_reserved_field, Document, Fields, Resource};
use crate::model::object_id::{IdError, ObjectId};
use crate::model::query::{Filter, PageDescriptor};
use crate::model::update::PartialUpdate;
use crate::repo::document_repo::{DocumentRepository, RepoError};
use crate::service::cursor::DocumentCursor;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type AccessResult<T> = Result<T, AccessError>;

/// Outcome kinds surfaced to the routing layer.
#[derive(Debug)]
pub enum AccessError {
    /// Public id does not decode; the store was not touched.
    InvalidIdentifier(IdError),
    /// Create payload failed validation; nothing was written.
    InvalidResource(CodecError),
    /// Update set names unknown, immutable or mistyped fields; nothing was written.
    InvalidUpdate(CodecError),
    /// List filter is malformed; the store was not queried.
    InvalidQuery(CodecError),
    NotFound(ObjectId),
    /// The store holds a document this collection's codec cannot decode.
    InvalidData(String),
    StoreUnavailable(RepoError),
}

impl Display for AccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidIdentifier(err) => write!(f, "invalid identifier: {err}"),
            Self::InvalidResource(err) => write!(f, "invalid resource: {err}"),
            Self::InvalidUpdate(err) => write!(f, "invalid update: {err}"),
            Self::InvalidQuery(err) => write!(f, "invalid query: {err}"),
            Self::NotFound(id) => write!(f, "no document with id '{id}'"),
            Self::InvalidData(message) => write!(f, "{message}"),
            Self::StoreUnavailable(err) => write!(f, "store unavailable: {err}"),
        }
    }
}

impl Error for AccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidIdentifier(err) => Some(err),
            Self::InvalidResource(err) | Self::InvalidUpdate(err) | Self::InvalidQuery(err) => {
                Some(err)
            }
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
            Self::StoreUnavailable(err) => Some(err),
        }
    }
}

impl From<IdError> for AccessError {
    fn from(value: IdError) -> Self {
        Self::InvalidIdentifier(value)
    }
}

impl From<RepoError> for AccessError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::InvalidData(message) => Self::InvalidData(message),
            other => Self::StoreUnavailable(other),
        }
    }
}

/// Access layer bound to one collection, one repository and one codec.
///
/// The repository is injected, so the same service runs over SQLite or the
/// in-memory substitute; the codec selects structural or schema-checked
/// records.
pub struct DocumentService<R: DocumentRepository, C: RecordCodec> {
    repo: R,
    codec: C,
    collection: String,
}

impl<R: DocumentRepository, C: RecordCodec> DocumentService<R, C> {
    pub fn new(repo: R, codec: C, collection: impl Into<String>) -> Self {
        Self {
            repo,
            codec,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Checks the store connection.
    pub fn ping(&self) -> AccessResult<()> {
        Ok(self.repo.ping()?)
    }

    /// Creates one document and returns it with its assigned public id.
    ///
    /// # Contract
    /// - Payloads carrying `id` or `_id` are rejected; ids are server-assigned.
    /// - One durable write on success, none on failure.
    pub fn create(&self, payload: Fields) -> AccessResult<Resource> {
        self.check_new(&payload)?;

        let id = self.repo.insert_one(&self.collection, &payload)?;
        Ok(Resource {
            id,
            fields: payload,
        })
    }

    /// Creates many documents in one atomic batch.
    ///
    /// Every payload is validated before anything is written; the first
    /// invalid payload fails the whole batch.
    pub fn create_many(&self, payloads: Vec<Fields>) -> AccessResult<Vec<Resource>> {
        self.validate_all(&payloads)?;

        let ids = self.repo.insert_many(&self.collection, &payloads)?;
        Ok(ids
            .into_iter()
            .zip(payloads)
            .map(|(id, fields)| Resource { id, fields })
            .collect())
    }

    /// Validates create payloads without writing anything.
    pub fn validate_all(&self, payloads: &[Fields]) -> AccessResult<()> {
        payloads.iter().try_for_each(|payload| self.check_new(payload))
    }

    /// Gets one document by public id.
    pub fn get(&self, public_id: &str) -> AccessResult<Resource> {
        let id = ObjectId::parse_str(public_id)?;
        let document = self
            .repo
            .find_one(&self.collection, id)?
            .ok_or(AccessError::NotFound(id))?;
        self.decode(document)
    }

    /// Lists documents in creation order.
    ///
    /// The returned cursor reads the collection in bounded batches as it is
    /// iterated; no store call happens before the first `next`.
    pub fn list(
        &self,
        page: PageDescriptor,
        filter: Filter,
    ) -> AccessResult<DocumentCursor<'_, R, C>> {
        if let Some(field) = filter.invalid_field() {
            return Err(AccessError::InvalidQuery(CodecError::InvalidFieldName(
                field.to_string(),
            )));
        }
        Ok(DocumentCursor::new(self, page, filter))
    }

    /// Applies a partial update and returns the stored result.
    ///
    /// # Contract
    /// - Only fields present in `update` are written; all others keep their
    ///   stored values.
    /// - Unknown, reserved or mistyped fields fail with `InvalidUpdate`
    ///   before the store is touched.
    pub fn update(&self, public_id: &str, update: &PartialUpdate) -> AccessResult<Resource> {
        let id = ObjectId::parse_str(public_id)?;
        if update.is_empty() {
            return Err(AccessError::InvalidUpdate(CodecError::EmptyUpdate));
        }
        if let Some(name) = update.field_names().find(|name| is_reserved_field(name)) {
            return Err(AccessError::InvalidUpdate(CodecError::ReservedField(
                name.to_string(),
            )));
        }
        self.codec
            .validate_update(update)
            .map_err(AccessError::InvalidUpdate)?;

        let document = self
            .repo
            .update_fields(&self.collection, id, update.fields())?
            .ok_or(AccessError::NotFound(id))?;
        self.decode(document)
    }

    /// Deletes one document by public id.
    ///
    /// A second delete of the same id fails with `NotFound`.
    pub fn delete(&self, public_id: &str) -> AccessResult<()> {
        let id = ObjectId::parse_str(public_id)?;
        if self.repo.delete_one(&self.collection, id)? {
            Ok(())
        } else {
            Err(AccessError::NotFound(id))
        }
    }

    /// Removes every document in the collection. Used by bulk loaders.
    pub fn clear(&self) -> AccessResult<u64> {
        Ok(self.repo.delete_all(&self.collection)?)
    }

    fn check_new(&self, payload: &Fields) -> AccessResult<()> {
        if let Some(name) = payload.keys().find(|name| is_reserved_field(name)) {
            return Err(AccessError::InvalidResource(CodecError::ReservedField(
                name.clone(),
            )));
        }
        self.codec
            .validate_new(payload)
            .map_err(AccessError::InvalidResource)
    }

    pub(crate) fn repo(&self) -> &R {
        &self.repo
    }

    pub(crate) fn decode(&self, document: Document) -> AccessResult<Resource> {
        self.codec
            .decode(document)
            .map_err(|err| AccessError::InvalidData(err.to_string()))
    }
}
