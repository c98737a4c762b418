//! Store-assigned document identifier and its public string form.
//!
//! # Responsibility
//! - Generate globally unique, creation-ordered identifiers.
//! - Convert losslessly between raw bytes and the 24-char hex public form.
//!
//! # Invariants
//! - Byte order equals creation order within one process (until the 24-bit
//!   counter wraps).
//! - `to_hex` always emits lowercase, so `parse_str(id.to_hex())` round-trips
//!   and `parse_str(s).to_hex() == s` for every string this crate produced.
//! - Malformed public identifiers are rejected before any store access.

use once_cell::sync::Lazy;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Raw identifier width in bytes.
pub const OBJECT_ID_LEN: usize = 12;
/// Width of the encoded public form.
pub const OBJECT_ID_HEX_LEN: usize = OBJECT_ID_LEN * 2;

const COUNTER_MASK: u32 = 0x00FF_FFFF;

/// Random per-process value occupying bytes 4..9.
static PROCESS_UNIQUE: Lazy<[u8; 5]> = Lazy::new(|| {
    let random = Uuid::new_v4();
    let mut value = [0u8; 5];
    value.copy_from_slice(&random.as_bytes()[..5]);
    value
});

static COUNTER: Lazy<AtomicU32> = Lazy::new(|| {
    let random = Uuid::new_v4();
    let bytes = random.as_bytes();
    AtomicU32::new(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
});

/// Decoding failure for a public identifier string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    InvalidLength { actual: usize },
    InvalidCharacter { position: usize, found: char },
}

impl Display for IdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLength { actual } => write!(
                f,
                "identifier must be {OBJECT_ID_HEX_LEN} hex characters, got {actual}"
            ),
            Self::InvalidCharacter { position, found } => write!(
                f,
                "identifier has non-hex character `{found}` at position {position}"
            ),
        }
    }
}

impl Error for IdError {}

/// Opaque 12-byte identifier: 4-byte creation seconds, 5-byte process value,
/// 3-byte counter, all big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

impl ObjectId {
    /// Generates a fresh identifier stamped with the current time.
    pub fn new() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        let counter = COUNTER.fetch_add(1, Ordering::SeqCst) & COUNTER_MASK;
        Self::from_parts(secs as u32, *PROCESS_UNIQUE, counter)
    }

    /// Assembles an identifier from its three components.
    ///
    /// Only the low 24 bits of `counter` are kept.
    pub fn from_parts(timestamp_secs: u32, process_unique: [u8; 5], counter: u32) -> Self {
        let mut bytes = [0u8; OBJECT_ID_LEN];
        bytes[..4].copy_from_slice(&timestamp_secs.to_be_bytes());
        bytes[4..9].copy_from_slice(&process_unique);
        bytes[9..].copy_from_slice(&(counter & COUNTER_MASK).to_be_bytes()[1..]);
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; OBJECT_ID_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> [u8; OBJECT_ID_LEN] {
        self.0
    }

    /// Creation time embedded in the identifier, in unix seconds.
    pub fn timestamp_secs(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// Decodes the public form. Accepts either hex case.
    pub fn parse_str(value: &str) -> Result<Self, IdError> {
        let raw = value.as_bytes();
        if raw.len() != OBJECT_ID_HEX_LEN {
            return Err(IdError::InvalidLength {
                actual: value.chars().count(),
            });
        }

        let mut bytes = [0u8; OBJECT_ID_LEN];
        for (index, pair) in raw.chunks_exact(2).enumerate() {
            let high = hex_value(pair[0]).ok_or_else(|| bad_char(value, index * 2))?;
            let low = hex_value(pair[1]).ok_or_else(|| bad_char(value, index * 2 + 1))?;
            bytes[index] = (high << 4) | low;
        }
        Ok(Self(bytes))
    }

    /// Encodes the public form as lowercase hex.
    pub fn to_hex(&self) -> String {
        const DIGITS: &[u8; 16] = b"0123456789abcdef";
        let mut out = String::with_capacity(OBJECT_ID_HEX_LEN);
        for byte in self.0 {
            out.push(DIGITS[usize::from(byte >> 4)] as char);
            out.push(DIGITS[usize::from(byte & 0x0F)] as char);
        }
        out
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = IdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse_str(value)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse_str(&text).map_err(D::Error::custom)
    }
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

fn bad_char(value: &str, byte_position: usize) -> IdError {
    // Input length matched in bytes, so a multi-byte char lands here too.
    let found = value
        .get(byte_position..)
        .and_then(|rest| rest.chars().next())
        .unwrap_or('\u{FFFD}');
    IdError::InvalidCharacter {
        position: byte_position,
        found,
    }
}
