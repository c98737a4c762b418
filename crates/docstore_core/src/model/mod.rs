//! Record shapes shared by every layer.
//!
//! # Responsibility
//! - Define the Resource/Document pair, identifiers, update sets and queries.
//! - Declare schemas for typed models.
//!
//! # Invariants
//! - Every stored record is identified by a store-assigned `ObjectId`.
//! - Update sets only ever carry fields the caller supplied.

pub mod document;
pub mod object_id;
pub mod profile;
pub mod query;
pub mod schema;
pub mod update;
