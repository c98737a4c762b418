#![allow(dead_code)]

use docstore_core::{
    Document, DocumentRepository, Fields, FindQuery, MemoryDocumentRepository, ObjectId,
    RepoError, RepoResult,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn fields(value: Value) -> Fields {
    value.as_object().cloned().expect("fixture must be a JSON object")
}

pub fn widget() -> Fields {
    fields(json!({"name": "Widget", "qty": 5}))
}

pub fn sample_profile() -> Fields {
    fields(json!({
        "job": "Research officer, trade union",
        "company": "Brown PLC",
        "ssn": "636-75-3518",
        "residence": "3409 Robinson Harbor\nNorth Monica, HI 17943",
        "current_location": [89.371661, -102.604933],
        "blood_group": "AB+",
        "website": ["http://carlson.com/", "https://www.dougherty.info/"],
        "username": "terry53",
        "name": "Whitney Davis",
        "sex": "F",
        "address": "3874 Brittany Rue Apt. 447\nWest Amber, AK 09494",
        "mail": "ztorres@hotmail.com",
        "birthdate": "1987-07-19T00:00:00"
    }))
}

/// Memory repository that counts every store call.
#[derive(Default)]
pub struct CountingRepository {
    inner: MemoryDocumentRepository,
    calls: AtomicUsize,
}

impl CountingRepository {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl DocumentRepository for &CountingRepository {
    fn ping(&self) -> RepoResult<()> {
        self.touch();
        self.inner.ping()
    }

    fn insert_one(&self, collection: &str, body: &Fields) -> RepoResult<ObjectId> {
        self.touch();
        self.inner.insert_one(collection, body)
    }

    fn insert_many(&self, collection: &str, bodies: &[Fields]) -> RepoResult<Vec<ObjectId>> {
        self.touch();
        self.inner.insert_many(collection, bodies)
    }

    fn find_one(&self, collection: &str, id: ObjectId) -> RepoResult<Option<Document>> {
        self.touch();
        self.inner.find_one(collection, id)
    }

    fn find_batch(&self, collection: &str, query: &FindQuery<'_>) -> RepoResult<Vec<Document>> {
        self.touch();
        self.inner.find_batch(collection, query)
    }

    fn update_fields(
        &self,
        collection: &str,
        id: ObjectId,
        set: &Fields,
    ) -> RepoResult<Option<Document>> {
        self.touch();
        self.inner.update_fields(collection, id, set)
    }

    fn delete_one(&self, collection: &str, id: ObjectId) -> RepoResult<bool> {
        self.touch();
        self.inner.delete_one(collection, id)
    }

    fn delete_all(&self, collection: &str) -> RepoResult<u64> {
        self.touch();
        self.inner.delete_all(collection)
    }
}

/// Repository whose every call fails as if the network were down.
pub struct UnreachableRepository;

fn unreachable_store<T>() -> RepoResult<T> {
    Err(RepoError::Unavailable("connection refused".to_string()))
}

impl DocumentRepository for UnreachableRepository {
    fn ping(&self) -> RepoResult<()> {
        unreachable_store()
    }

    fn insert_one(&self, _collection: &str, _body: &Fields) -> RepoResult<ObjectId> {
        unreachable_store()
    }

    fn insert_many(&self, _collection: &str, _bodies: &[Fields]) -> RepoResult<Vec<ObjectId>> {
        unreachable_store()
    }

    fn find_one(&self, _collection: &str, _id: ObjectId) -> RepoResult<Option<Document>> {
        unreachable_store()
    }

    fn find_batch(&self, _collection: &str, _query: &FindQuery<'_>) -> RepoResult<Vec<Document>> {
        unreachable_store()
    }

    fn update_fields(
        &self,
        _collection: &str,
        _id: ObjectId,
        _set: &Fields,
    ) -> RepoResult<Option<Document>> {
        unreachable_store()
    }

    fn delete_one(&self, _collection: &str, _id: ObjectId) -> RepoResult<bool> {
        unreachable_store()
    }

    fn delete_all(&self, _collection: &str) -> RepoResult<u64> {
        unreachable_store()
    }
}
