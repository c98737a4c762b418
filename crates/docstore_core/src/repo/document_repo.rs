//! Document repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide insert/find/update/delete calls over named collections.
//! - Keep SQL and JSON-path details inside the persistence boundary.
//!
//! # Invariants
//! - The store assigns ids at insert; callers never supply them.
//! - Field updates are expressed as one `json_set` merge, never as a
//!   whole-body overwrite.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::{DbError, StoreHandle};
use crate::model::document::{Document, Fields};
use crate::model::object_id::ObjectId;
use crate::model::query::Filter;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Row};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Store-level failure.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// The store could not be reached for a reason other than SQLite.
    Unavailable(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Unavailable(message) => write!(f, "document store unavailable: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted document data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Unavailable(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One bounded batch request, ordered by id ascending.
#[derive(Debug, Clone, Copy)]
pub struct FindQuery<'a> {
    pub filter: &'a Filter,
    /// Only documents whose id sorts strictly after this one.
    pub after: Option<ObjectId>,
    /// Matching documents to skip before the batch starts.
    pub skip: u64,
    pub limit: u32,
}

/// Repository interface over a document store.
pub trait DocumentRepository {
    /// Checks that the store answers.
    fn ping(&self) -> RepoResult<()>;
    /// Persists one body under a freshly assigned id.
    fn insert_one(&self, collection: &str, body: &Fields) -> RepoResult<ObjectId>;
    /// Persists many bodies atomically, in order.
    fn insert_many(&self, collection: &str, bodies: &[Fields]) -> RepoResult<Vec<ObjectId>>;
    fn find_one(&self, collection: &str, id: ObjectId) -> RepoResult<Option<Document>>;
    fn find_batch(&self, collection: &str, query: &FindQuery<'_>) -> RepoResult<Vec<Document>>;
    /// Merges `set` into the stored body. Returns `None` when `id` is absent.
    fn update_fields(
        &self,
        collection: &str,
        id: ObjectId,
        set: &Fields,
    ) -> RepoResult<Option<Document>>;
    /// Returns whether a document was removed.
    fn delete_one(&self, collection: &str, id: ObjectId) -> RepoResult<bool>;
    /// Removes every document of the collection and returns the count.
    fn delete_all(&self, collection: &str) -> RepoResult<u64>;
}

/// SQLite-backed document repository.
pub struct SqliteDocumentRepository<'h> {
    handle: &'h StoreHandle,
}

impl<'h> SqliteDocumentRepository<'h> {
    pub fn new(handle: &'h StoreHandle) -> Self {
        Self { handle }
    }
}

impl DocumentRepository for SqliteDocumentRepository<'_> {
    fn ping(&self) -> RepoResult<()> {
        Ok(self.handle.ping()?)
    }

    fn insert_one(&self, collection: &str, body: &Fields) -> RepoResult<ObjectId> {
        let encoded = encode_body(body)?;
        let id = ObjectId::new();
        let conn = self.handle.lock()?;
        conn.execute(
            "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3);",
            params![collection, id.to_hex(), encoded],
        )?;
        Ok(id)
    }

    fn insert_many(&self, collection: &str, bodies: &[Fields]) -> RepoResult<Vec<ObjectId>> {
        let encoded = bodies
            .iter()
            .map(encode_body)
            .collect::<RepoResult<Vec<_>>>()?;

        let mut conn = self.handle.lock()?;
        let tx = conn.transaction()?;
        let mut ids = Vec::with_capacity(encoded.len());
        {
            let mut stmt =
                tx.prepare("INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3);")?;
            for body in &encoded {
                let id = ObjectId::new();
                stmt.execute(params![collection, id.to_hex(), body])?;
                ids.push(id);
            }
        }
        tx.commit()?;
        Ok(ids)
    }

    fn find_one(&self, collection: &str, id: ObjectId) -> RepoResult<Option<Document>> {
        let conn = self.handle.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, body
             FROM documents
             WHERE collection = ?1 AND id = ?2;",
        )?;

        let mut rows = stmt.query(params![collection, id.to_hex()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_document_row(row)?));
        }

        Ok(None)
    }

    fn find_batch(&self, collection: &str, query: &FindQuery<'_>) -> RepoResult<Vec<Document>> {
        let mut sql = String::from("SELECT id, body FROM documents WHERE collection = ?");
        let mut bind_values: Vec<SqlValue> = vec![SqlValue::Text(collection.to_string())];

        if let Some(after) = query.after {
            sql.push_str(" AND id > ?");
            bind_values.push(SqlValue::Text(after.to_hex()));
        }

        for predicate in query.filter.predicates() {
            sql.push_str(" AND body -> ? = json(?)");
            bind_values.push(SqlValue::Text(json_path(&predicate.field)));
            bind_values.push(SqlValue::Text(predicate.value.to_string()));
        }

        sql.push_str(" ORDER BY id ASC LIMIT ? OFFSET ?");
        bind_values.push(SqlValue::Integer(i64::from(query.limit)));
        bind_values.push(SqlValue::Integer(
            i64::try_from(query.skip).unwrap_or(i64::MAX),
        ));

        let conn = self.handle.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut documents = Vec::new();

        while let Some(row) = rows.next()? {
            documents.push(parse_document_row(row)?);
        }

        Ok(documents)
    }

    fn update_fields(
        &self,
        collection: &str,
        id: ObjectId,
        set: &Fields,
    ) -> RepoResult<Option<Document>> {
        if set.is_empty() {
            return self.find_one(collection, id);
        }

        let mut merge_args = Vec::with_capacity(set.len());
        let mut bind_values: Vec<SqlValue> = vec![
            SqlValue::Text(collection.to_string()),
            SqlValue::Text(id.to_hex()),
        ];
        for (field, value) in set {
            // ?1 and ?2 are collection and id; merge arguments start at ?3.
            let path_index = bind_values.len() + 1;
            merge_args.push(format!("?{path_index}, json(?{})", path_index + 1));
            bind_values.push(SqlValue::Text(json_path(field)));
            bind_values.push(SqlValue::Text(value.to_string()));
        }
        let assignments = format!("json_set(body, {})", merge_args.join(", "));

        let sql = format!(
            "UPDATE documents
             SET
                body = {assignments},
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE collection = ?1 AND id = ?2
             RETURNING id, body;"
        );

        let conn = self.handle.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_document_row(row)?));
        }

        Ok(None)
    }

    fn delete_one(&self, collection: &str, id: ObjectId) -> RepoResult<bool> {
        let conn = self.handle.lock()?;
        let changed = conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2;",
            params![collection, id.to_hex()],
        )?;
        Ok(changed > 0)
    }

    fn delete_all(&self, collection: &str) -> RepoResult<u64> {
        let conn = self.handle.lock()?;
        let changed = conn.execute(
            "DELETE FROM documents WHERE collection = ?1;",
            params![collection],
        )?;
        Ok(changed as u64)
    }
}

fn json_path(field: &str) -> String {
    format!("$.\"{field}\"")
}

fn encode_body(body: &Fields) -> RepoResult<String> {
    serde_json::to_string(body)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode document body: {err}")))
}

fn parse_document_row(row: &Row<'_>) -> RepoResult<Document> {
    let id_text: String = row.get("id")?;
    let id = ObjectId::parse_str(&id_text).map_err(|err| {
        RepoError::InvalidData(format!("invalid id value `{id_text}` in documents.id: {err}"))
    })?;

    let body_text: String = row.get("body")?;
    let body = match serde_json::from_str::<Value>(&body_text) {
        Ok(Value::Object(body)) => body,
        Ok(other) => {
            return Err(RepoError::InvalidData(format!(
                "document `{id}` body is not an object: {other}"
            )));
        }
        Err(err) => {
            return Err(RepoError::InvalidData(format!(
                "document `{id}` body is not valid JSON: {err}"
            )));
        }
    };

    Ok(Document { id, body })
}
