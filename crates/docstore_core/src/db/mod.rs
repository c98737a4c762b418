//! Document store lifecycle, configuration and schema migration.
//!
//! # Responsibility
//! - Resolve store configuration from the process environment.
//! - Open the shared store handle once, and close it once.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No document is read or written before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod config;
pub mod migrations;
mod open;

pub use config::{ConfigError, StoreConfig, StoreTarget, DEFAULT_COLLECTION, STORE_URI_ENV};
pub use open::StoreHandle;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// A thread panicked while holding the connection.
    ConnectionPoisoned,
    PingFailed(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::ConnectionPoisoned => write!(f, "store connection lock is poisoned"),
            Self::PingFailed(message) => write!(f, "problem connecting to document store: {message}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::ConnectionPoisoned => None,
            Self::PingFailed(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
