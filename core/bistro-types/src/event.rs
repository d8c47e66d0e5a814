//! Change events for collection reconciliation.
//!
//! The hosted backend streams one payload per row change, shaped as
//! `{"eventType": "INSERT" | "UPDATE" | "DELETE", "new": {..}, "old": {..}}`.
//! Payloads are validated here, at the boundary, into the closed
//! [`ChangeEvent`] variant; anything else is rejected with an [`Error`].

use crate::{Error, RecordId, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The operation carried by a change payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

impl FromStr for ChangeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "INSERT" => Ok(Self::Insert),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            _ => Err(Error::UnknownEventType(s.to_string())),
        }
    }
}

/// Raw change payload as delivered by the change stream.
///
/// `new` is empty for deletes and `old` may carry only the primary key
/// when the table does not publish full old rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangePayload {
    #[serde(rename = "eventType")]
    pub event_type: String,
    #[serde(default)]
    pub new: serde_json::Value,
    #[serde(default)]
    pub old: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
}

impl ChangePayload {
    /// Parses a payload from its JSON text form.
    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A normalized change to one record.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent<R> {
    /// A row was inserted.
    Insert(R),
    /// A row was updated; `old.id` identifies the entry to replace.
    Update { old: R, new: R },
    /// A row was deleted.
    Delete(RecordId),
}

impl<R> ChangeEvent<R> {
    /// Returns the operation kind.
    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::Insert(_) => ChangeKind::Insert,
            Self::Update { .. } => ChangeKind::Update,
            Self::Delete(_) => ChangeKind::Delete,
        }
    }
}

impl<R: DeserializeOwned + Clone> ChangeEvent<R> {
    /// Validates a raw payload into a change event.
    ///
    /// An update whose `old` row is partial (key only) reuses `new` as the
    /// old image, provided both rows name the same id.
    pub fn decode(payload: &ChangePayload) -> Result<Self> {
        match payload.event_type.parse::<ChangeKind>()? {
            ChangeKind::Insert => Ok(Self::Insert(decode_row(&payload.new, "new")?)),
            ChangeKind::Update => {
                let new: R = decode_row(&payload.new, "new")?;
                let old = match serde_json::from_value::<R>(payload.old.clone()) {
                    Ok(old) => old,
                    Err(_) => {
                        let old_id = RecordId::from_row(&payload.old);
                        let new_id = RecordId::from_row(&payload.new);
                        match old_id {
                            Some(id) if Some(&id) != new_id.as_ref() => {
                                return Err(Error::InvalidPayload(format!(
                                    "update changes primary key from {id}"
                                )));
                            }
                            _ => new.clone(),
                        }
                    }
                };
                Ok(Self::Update { old, new })
            }
            ChangeKind::Delete => RecordId::from_row(&payload.old)
                .map(Self::Delete)
                .ok_or_else(|| Error::InvalidPayload("delete without old.id".into())),
        }
    }

    /// Parses and validates a payload from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::decode(&ChangePayload::parse(json)?)
    }
}

impl<R: Serialize> ChangeEvent<R> {
    /// Encodes this event in the wire shape used by the change stream.
    pub fn to_payload(&self, table: &str) -> Result<ChangePayload> {
        let empty = || serde_json::Value::Object(Default::default());
        let (new, old) = match self {
            Self::Insert(r) => (serde_json::to_value(r)?, empty()),
            Self::Update { old, new } => (serde_json::to_value(new)?, serde_json::to_value(old)?),
            Self::Delete(id) => (empty(), serde_json::json!({ "id": id })),
        };
        Ok(ChangePayload {
            event_type: self.kind().to_string(),
            new,
            old,
            table: Some(table.to_string()),
        })
    }
}

fn decode_row<R: DeserializeOwned>(row: &serde_json::Value, side: &str) -> Result<R> {
    if row.is_null() || row.as_object().is_some_and(|o| o.is_empty()) {
        return Err(Error::InvalidPayload(format!("missing `{side}` row")));
    }
    serde_json::from_value(row.clone())
        .map_err(|e| Error::InvalidPayload(format!("malformed `{side}` row: {e}")))
}
