//! Document store contracts and persistence implementations.
//!
//! # Responsibility
//! - Define the collection-level operations the access layer may issue.
//! - Isolate SQLite query details from the access layer.
//!
//! # Invariants
//! - Single-document writes are atomic; no multi-document transactions are
//!   exposed except bulk insert.
//! - `update_fields` merges named fields into the stored body and leaves
//!   every other field untouched.
//! - Batches come back in ascending `ObjectId` order.

pub mod document_repo;
pub mod memory_repo;

pub use document_repo::{
    DocumentRepository, FindQuery, RepoError, RepoResult, SqliteDocumentRepository,
};
pub use memory_repo::MemoryDocumentRepository;
