//! Document access layer over a document store.
//! Maps API-facing resources to stored documents with consistent identifier,
//! pagination and partial-update rules.

pub mod codec;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod seed;
pub mod service;

pub use codec::{CodecError, DynamicCodec, RecordCodec, TypedCodec};
pub use db::{StoreConfig, StoreHandle};
pub use logging::{default_log_level, init_logging, logging_status, LogSettings};
pub use model::document::{Document, Fields, Resource};
pub use model::object_id::{IdError, ObjectId};
pub use model::profile::{Profile, ProfilePatch};
pub use model::query::{Filter, PageDescriptor, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
pub use model::schema::{FieldKind, FieldSpec, Model};
pub use model::update::PartialUpdate;
pub use repo::{
    DocumentRepository, FindQuery, MemoryDocumentRepository, RepoError, RepoResult,
    SqliteDocumentRepository,
};
pub use seed::{load_sample_data, SeedError};
pub use service::cursor::{DocumentCursor, LIST_BATCH_SIZE};
pub use service::document_service::{AccessError, AccessResult, DocumentService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
