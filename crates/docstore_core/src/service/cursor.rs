//! Batched list cursor.
//!
//! # Invariants
//! - At most `LIST_BATCH_SIZE` documents are buffered at a time.
//! - Batches continue from the last seen id (keyset), so the offset is only
//!   applied to the first batch.
//! - After the first error the cursor is exhausted.

use crate::codec::RecordCodec;
use crate::model::document::{Document, Resource};
use crate::model::object_id::ObjectId;
use crate::model::query::{Filter, PageDescriptor};
use crate::repo::document_repo::{DocumentRepository, FindQuery};
use crate::service::document_service::{AccessResult, DocumentService};
use std::collections::VecDeque;
use std::iter::FusedIterator;

/// Documents fetched per store round trip.
pub const LIST_BATCH_SIZE: u32 = 32;

/// Lazy, finite sequence of resources in creation order.
pub struct DocumentCursor<'a, R: DocumentRepository, C: RecordCodec> {
    service: &'a DocumentService<R, C>,
    filter: Filter,
    after: Option<ObjectId>,
    skip: u64,
    remaining: u32,
    buffer: VecDeque<Document>,
    last_yielded: Option<ObjectId>,
    exhausted: bool,
}

impl<'a, R: DocumentRepository, C: RecordCodec> DocumentCursor<'a, R, C> {
    pub(crate) fn new(
        service: &'a DocumentService<R, C>,
        page: PageDescriptor,
        filter: Filter,
    ) -> Self {
        let remaining = page.effective_limit();
        let (after, skip) = match page {
            PageDescriptor::Offset { offset, .. } => (None, offset),
            PageDescriptor::Cursor { after, .. } => (after, 0),
        };
        Self {
            service,
            filter,
            after,
            skip,
            remaining,
            buffer: VecDeque::new(),
            last_yielded: None,
            exhausted: false,
        }
    }

    /// Id of the last document handed out, usable as the next `after`.
    pub fn last_id(&self) -> Option<ObjectId> {
        self.last_yielded
    }

    fn fill(&mut self) -> AccessResult<()> {
        let batch = self.remaining.min(LIST_BATCH_SIZE);
        let query = FindQuery {
            filter: &self.filter,
            after: self.after,
            skip: self.skip,
            limit: batch,
        };
        let documents = self
            .service
            .repo()
            .find_batch(self.service.collection(), &query)?;

        self.skip = 0;
        if documents.len() < batch as usize {
            self.exhausted = true;
        }
        if let Some(last) = documents.last() {
            self.after = Some(last.id);
        }
        self.buffer.extend(documents);
        Ok(())
    }
}

impl<R: DocumentRepository, C: RecordCodec> Iterator for DocumentCursor<'_, R, C> {
    type Item = AccessResult<Resource>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        if self.buffer.is_empty() {
            if self.exhausted {
                return None;
            }
            if let Err(err) = self.fill() {
                self.exhausted = true;
                self.remaining = 0;
                return Some(Err(err));
            }
        }

        let document = self.buffer.pop_front()?;
        self.remaining -= 1;
        self.last_yielded = Some(document.id);
        match self.service.decode(document) {
            Ok(resource) => Some(Ok(resource)),
            Err(err) => {
                self.remaining = 0;
                self.buffer.clear();
                Some(Err(err))
            }
        }
    }
}

impl<R: DocumentRepository, C: RecordCodec> FusedIterator for DocumentCursor<'_, R, C> {}
