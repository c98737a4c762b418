//! Store configuration from the process environment.
//!
//! # Responsibility
//! - Parse the connection-string-shaped `DOCSTORE_URI` value.
//!
//! # Invariants
//! - Read once by the composition root; the access layer never sees it.
//!
//! Accepted shapes:
//! - `sqlite:<path>[?collection=<name>]`
//! - `sqlite::memory:[?collection=<name>]`

use crate::model::document::is_valid_field_name;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Environment variable holding the store connection string.
pub const STORE_URI_ENV: &str = "DOCSTORE_URI";
/// Collection used when the connection string does not name one.
pub const DEFAULT_COLLECTION: &str = "profiles";

const SCHEME: &str = "sqlite:";
const MEMORY_TARGET: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    UnsupportedScheme(String),
    EmptyPath,
    UnknownOption(String),
    InvalidCollection(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "environment variable `{key}` is not set"),
            Self::UnsupportedScheme(uri) => {
                write!(f, "unsupported store uri `{uri}`; expected `sqlite:<path>`")
            }
            Self::EmptyPath => write!(f, "store uri has an empty database path"),
            Self::UnknownOption(option) => write!(f, "unknown store uri option `{option}`"),
            Self::InvalidCollection(name) => write!(f, "invalid collection name `{name}`"),
        }
    }
}

impl Error for ConfigError {}

/// Where the store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTarget {
    File(PathBuf),
    Memory,
}

/// Resolved store endpoint plus target collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub target: StoreTarget,
    pub collection: String,
}

impl StoreConfig {
    /// Reads `DOCSTORE_URI` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let uri = lookup(STORE_URI_ENV)
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::Missing(STORE_URI_ENV))?;
        Self::parse(&uri)
    }

    /// Parses a connection string.
    pub fn parse(uri: &str) -> Result<Self, ConfigError> {
        let uri = uri.trim();
        let rest = uri
            .strip_prefix(SCHEME)
            .ok_or_else(|| ConfigError::UnsupportedScheme(uri.to_string()))?;

        let (location, query) = match rest.split_once('?') {
            Some((location, query)) => (location, Some(query)),
            None => (rest, None),
        };

        let target = match location {
            MEMORY_TARGET => StoreTarget::Memory,
            "" => return Err(ConfigError::EmptyPath),
            path => StoreTarget::File(PathBuf::from(path.strip_prefix("//").unwrap_or(path))),
        };

        let mut collection = DEFAULT_COLLECTION.to_string();
        for option in query.into_iter().flat_map(|q| q.split('&')) {
            if option.is_empty() {
                continue;
            }
            match option.split_once('=') {
                Some(("collection", name)) => {
                    if !is_valid_field_name(name) {
                        return Err(ConfigError::InvalidCollection(name.to_string()));
                    }
                    collection = name.to_string();
                }
                _ => return Err(ConfigError::UnknownOption(option.to_string())),
            }
        }

        Ok(Self { target, collection })
    }

    /// In-memory store, mostly for tests.
    pub fn in_memory(collection: impl Into<String>) -> Self {
        Self {
            target: StoreTarget::Memory,
            collection: collection.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, StoreConfig, StoreTarget, DEFAULT_COLLECTION, STORE_URI_ENV};
    use std::path::PathBuf;

    #[test]
    fn parses_file_uri_with_collection() {
        let config = StoreConfig::parse("sqlite:/var/lib/docstore/app.db?collection=people").unwrap();
        assert_eq!(
            config.target,
            StoreTarget::File(PathBuf::from("/var/lib/docstore/app.db"))
        );
        assert_eq!(config.collection, "people");
    }

    #[test]
    fn parses_memory_uri_with_default_collection() {
        let config = StoreConfig::parse("sqlite::memory:").unwrap();
        assert_eq!(config.target, StoreTarget::Memory);
        assert_eq!(config.collection, DEFAULT_COLLECTION);
    }

    #[test]
    fn double_slash_prefix_is_optional() {
        let config = StoreConfig::parse("sqlite:///tmp/app.db").unwrap();
        assert_eq!(config.target, StoreTarget::File(PathBuf::from("/tmp/app.db")));
    }

    #[test]
    fn rejects_bad_uris() {
        assert!(matches!(
            StoreConfig::parse("mongodb://localhost/app"),
            Err(ConfigError::UnsupportedScheme(_))
        ));
        assert_eq!(StoreConfig::parse("sqlite:"), Err(ConfigError::EmptyPath));
        assert!(matches!(
            StoreConfig::parse("sqlite:app.db?replicaSet=rs0"),
            Err(ConfigError::UnknownOption(_))
        ));
        assert!(matches!(
            StoreConfig::parse("sqlite:app.db?collection=a.b"),
            Err(ConfigError::InvalidCollection(_))
        ));
    }

    #[test]
    fn missing_env_value_is_reported() {
        let err = StoreConfig::from_lookup(|_| None).unwrap_err();
        assert_eq!(err, ConfigError::Missing(STORE_URI_ENV));

        let config = StoreConfig::from_lookup(|key| {
            (key == STORE_URI_ENV).then(|| "sqlite::memory:?collection=widgets".to_string())
        })
        .unwrap();
        assert_eq!(config.collection, "widgets");
    }
}
