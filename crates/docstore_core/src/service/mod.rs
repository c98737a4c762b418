//! Document access use-cases.
//!
//! # Responsibility
//! - Expose create/get/list/update/delete to routing and tooling callers.
//! - Keep callers decoupled from storage and identifier encoding details.

pub mod cursor;
pub mod document_service;
