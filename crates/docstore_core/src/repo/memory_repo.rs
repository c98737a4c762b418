//! In-process document repository.
//!
//! Same contract as the SQLite repository, kept in ordered maps behind one
//! mutex. Used as the substitute store in tests and throwaway tooling.

use crate::model::document::{Document, Fields};
use crate::model::object_id::ObjectId;
use crate::model::query::Filter;
use crate::repo::document_repo::{DocumentRepository, FindQuery, RepoError, RepoResult};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Mutex, MutexGuard};

type Collections = BTreeMap<String, BTreeMap<ObjectId, Fields>>;

/// Memory-backed document repository.
#[derive(Debug, Default)]
pub struct MemoryDocumentRepository {
    collections: Mutex<Collections>,
}

impl MemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents stored in `collection`.
    pub fn count(&self, collection: &str) -> RepoResult<usize> {
        let collections = self.lock()?;
        Ok(collections.get(collection).map_or(0, BTreeMap::len))
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, Collections>> {
        self.collections
            .lock()
            .map_err(|_| RepoError::Unavailable("memory store lock is poisoned".to_string()))
    }
}

impl DocumentRepository for MemoryDocumentRepository {
    fn ping(&self) -> RepoResult<()> {
        self.lock().map(|_| ())
    }

    fn insert_one(&self, collection: &str, body: &Fields) -> RepoResult<ObjectId> {
        let id = ObjectId::new();
        self.lock()?
            .entry(collection.to_string())
            .or_default()
            .insert(id, body.clone());
        Ok(id)
    }

    fn insert_many(&self, collection: &str, bodies: &[Fields]) -> RepoResult<Vec<ObjectId>> {
        let mut collections = self.lock()?;
        let documents = collections.entry(collection.to_string()).or_default();
        let ids = bodies
            .iter()
            .map(|body| {
                let id = ObjectId::new();
                documents.insert(id, body.clone());
                id
            })
            .collect();
        Ok(ids)
    }

    fn find_one(&self, collection: &str, id: ObjectId) -> RepoResult<Option<Document>> {
        let collections = self.lock()?;
        Ok(collections
            .get(collection)
            .and_then(|documents| documents.get(&id))
            .map(|body| Document {
                id,
                body: body.clone(),
            }))
    }

    fn find_batch(&self, collection: &str, query: &FindQuery<'_>) -> RepoResult<Vec<Document>> {
        let collections = self.lock()?;
        let Some(documents) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let lower = match query.after {
            Some(after) => Bound::Excluded(after),
            None => Bound::Unbounded,
        };
        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);

        Ok(documents
            .range((lower, Bound::Unbounded))
            .filter(|(_, body)| matches_filter(body, query.filter))
            .skip(skip)
            .take(query.limit as usize)
            .map(|(id, body)| Document {
                id: *id,
                body: body.clone(),
            })
            .collect())
    }

    fn update_fields(
        &self,
        collection: &str,
        id: ObjectId,
        set: &Fields,
    ) -> RepoResult<Option<Document>> {
        let mut collections = self.lock()?;
        let Some(body) = collections
            .get_mut(collection)
            .and_then(|documents| documents.get_mut(&id))
        else {
            return Ok(None);
        };

        for (field, value) in set {
            body.insert(field.clone(), value.clone());
        }

        Ok(Some(Document {
            id,
            body: body.clone(),
        }))
    }

    fn delete_one(&self, collection: &str, id: ObjectId) -> RepoResult<bool> {
        let mut collections = self.lock()?;
        Ok(collections
            .get_mut(collection)
            .and_then(|documents| documents.remove(&id))
            .is_some())
    }

    fn delete_all(&self, collection: &str) -> RepoResult<u64> {
        let mut collections = self.lock()?;
        Ok(collections
            .remove(collection)
            .map_or(0, |documents| documents.len() as u64))
    }
}

fn matches_filter(body: &Fields, filter: &Filter) -> bool {
    filter
        .predicates()
        .iter()
        .all(|predicate| body.get(&predicate.field) == Some(&predicate.value))
}

#[cfg(test)]
mod tests {
    use super::MemoryDocumentRepository;
    use crate::model::document::Fields;
    use crate::repo::document_repo::DocumentRepository;
    use serde_json::json;

    #[test]
    fn delete_all_reports_removed_count() {
        let repo = MemoryDocumentRepository::new();
        let mut body = Fields::new();
        body.insert("name".to_string(), json!("a"));
        repo.insert_many("widgets", &[body.clone(), body]).unwrap();

        assert_eq!(repo.count("widgets").unwrap(), 2);
        assert_eq!(repo.delete_all("widgets").unwrap(), 2);
        assert_eq!(repo.count("widgets").unwrap(), 0);
    }
}
