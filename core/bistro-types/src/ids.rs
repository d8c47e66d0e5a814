//! Record identifiers.
//!
//! Hosted tables key rows either by an integer sequence or by a text/UUID
//! column. `RecordId` keeps whichever form the backend delivered so that the
//! id round-trips unchanged into filters and write payloads.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
enum Key {
    Int(i64),
    Text(String),
}

/// Opaque unique key of a record within its collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Key);

impl RecordId {
    /// Creates a text id.
    #[must_use]
    pub fn text(id: impl Into<String>) -> Self {
        Self(Key::Text(id.into()))
    }

    /// Creates an integer id.
    #[must_use]
    pub const fn int(id: i64) -> Self {
        Self(Key::Int(id))
    }

    /// Generates a fresh client-side key (UUID v4) for rows created locally.
    #[must_use]
    pub fn generate() -> Self {
        Self(Key::Text(uuid::Uuid::new_v4().to_string()))
    }

    /// Returns the integer form, if the backend keyed this row by a sequence.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self.0 {
            Key::Int(n) => Some(n),
            Key::Text(_) => None,
        }
    }

    /// Extracts the `id` member of a JSON row.
    pub fn from_row(row: &serde_json::Value) -> Option<Self> {
        row.get("id")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Key::Int(n) => write!(f, "{n}"),
            Key::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self::int(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self::text(id)
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self::text(id)
    }
}
