//! Core type definitions for Bistro.
//!
//! This crate defines the fundamental, entity-agnostic types used throughout
//! the storefront and back-office core:
//! - Record identifiers as delivered by the hosted backend (text or integer keys)
//! - Change events (insert/update/delete) and their wire decoding
//! - ISO-8601 timestamp helpers used for ordering records by instant
//!
//! Domain records (products, videos, gallery images, articles) live in
//! `bistro-model`, not here.

mod event;
mod ids;
mod timestamp;

pub use event::{ChangeEvent, ChangeKind, ChangePayload};
pub use ids::RecordId;
pub use timestamp::{now_iso, parse_instant};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unknown change event type: {0}")]
    UnknownEventType(String),

    #[error("invalid change payload: {0}")]
    InvalidPayload(String),
}
