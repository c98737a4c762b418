//! Sample data loader.
//!
//! # Responsibility
//! - Replace a collection's contents with records read from a JSON file.
//!
//! # Invariants
//! - Every record is validated by the collection's codec before the
//!   collection is cleared.
//! - Identifier keys in the file (`_id`, `id`) are discarded; the store
//!   assigns fresh ids.

use crate::codec::RecordCodec;
use crate::model::document::{Fields, INTERNAL_ID_FIELD, PUBLIC_ID_FIELD};
use crate::repo::document_repo::DocumentRepository;
use crate::service::document_service::{AccessError, DocumentService};
use log::{error, info};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Instant;

#[derive(Debug)]
pub enum SeedError {
    Io(std::io::Error),
    Json(serde_json::Error),
    NotAnArray,
    NotAnObject { index: usize },
    Access(AccessError),
}

impl Display for SeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cannot read sample data: {err}"),
            Self::Json(err) => write!(f, "sample data is not valid JSON: {err}"),
            Self::NotAnArray => write!(f, "sample data must be a JSON array of records"),
            Self::NotAnObject { index } => write!(f, "sample record {index} is not an object"),
            Self::Access(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SeedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::NotAnArray => None,
            Self::NotAnObject { .. } => None,
            Self::Access(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for SeedError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for SeedError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<AccessError> for SeedError {
    fn from(value: AccessError) -> Self {
        Self::Access(value)
    }
}

/// Parses sample records, dropping identifier keys.
pub fn parse_sample_data(text: &str) -> Result<Vec<Fields>, SeedError> {
    let Value::Array(items) = serde_json::from_str::<Value>(text)? else {
        return Err(SeedError::NotAnArray);
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(mut record) => {
                record.remove(INTERNAL_ID_FIELD);
                record.remove(PUBLIC_ID_FIELD);
                Ok(record)
            }
            _ => Err(SeedError::NotAnObject { index }),
        })
        .collect()
}

/// Clears the service's collection and loads every record from `path`.
///
/// Returns the number of records loaded.
///
/// # Side effects
/// - Emits `seed_load` logging events with count and duration.
pub fn load_sample_data<R, C>(
    service: &DocumentService<R, C>,
    path: impl AsRef<Path>,
) -> Result<usize, SeedError>
where
    R: DocumentRepository,
    C: RecordCodec,
{
    let started_at = Instant::now();
    let path = path.as_ref();
    info!(
        "event=seed_load module=seed status=start collection={} path={}",
        service.collection(),
        path.display()
    );

    let result = read_and_load(service, path);
    match &result {
        Ok(count) => info!(
            "event=seed_load module=seed status=ok collection={} count={} duration_ms={}",
            service.collection(),
            count,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=seed_load module=seed status=error collection={} duration_ms={} error={}",
            service.collection(),
            started_at.elapsed().as_millis(),
            err
        ),
    }
    result
}

fn read_and_load<R, C>(service: &DocumentService<R, C>, path: &Path) -> Result<usize, SeedError>
where
    R: DocumentRepository,
    C: RecordCodec,
{
    let records = parse_sample_data(&std::fs::read_to_string(path)?)?;
    service.validate_all(&records)?;
    service.clear()?;
    let created = service.create_many(records)?;
    Ok(created.len())
}
