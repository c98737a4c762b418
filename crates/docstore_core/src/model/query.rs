//! Page descriptors and equality filters for list queries.
//!
//! # Invariants
//! - Effective page limit is always within `1..=MAX_PAGE_LIMIT`.
//! - Results are ordered by `ObjectId` ascending, i.e. creation order.

use crate::model::document::is_valid_field_name;
use crate::model::object_id::ObjectId;
use serde_json::Value;

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Bounded slice of an ordered collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDescriptor {
    /// Skip `offset` documents, then return up to `limit`.
    Offset { offset: u64, limit: Option<u32> },
    /// Return up to `limit` documents whose id sorts after `after`.
    Cursor {
        after: Option<ObjectId>,
        limit: Option<u32>,
    },
}

impl PageDescriptor {
    /// First page with the default limit.
    pub fn first() -> Self {
        Self::Offset {
            offset: 0,
            limit: None,
        }
    }

    /// Limit after defaulting and clamping.
    pub fn effective_limit(&self) -> u32 {
        let requested = match self {
            Self::Offset { limit, .. } | Self::Cursor { limit, .. } => *limit,
        };
        requested
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT)
    }
}

impl Default for PageDescriptor {
    fn default() -> Self {
        Self::first()
    }
}

/// One `field == value` predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEquals {
    pub field: String,
    pub value: Value,
}

/// Conjunction of field-equality predicates. Empty matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<FieldEquals>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates.push(FieldEquals {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn predicates(&self) -> &[FieldEquals] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Returns the first predicate field that is not a valid field name.
    pub fn invalid_field(&self) -> Option<&str> {
        self.predicates
            .iter()
            .map(|predicate| predicate.field.as_str())
            .find(|field| !is_valid_field_name(field))
    }
}
