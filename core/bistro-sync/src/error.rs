//! Error types for the sync layer.

use bistro_model::ValidationError;
use bistro_storage::StorageError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Initial load or remote write failed.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The change stream could not be opened, or delivered an invalid payload.
    #[error("subscription error: {0}")]
    Subscription(String),

    /// A toggle's remote effect was rejected.
    #[error("toggle failed: {0}")]
    Toggle(String),

    /// Input rejected before any remote write.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// No location could be determined from this source.
    #[error("geolocation unavailable: {0}")]
    Geolocation(String),

    /// The cache holds no record with this id.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Timeout.
    #[error("operation timed out")]
    Timeout,

    /// The owning store was disposed before the operation completed.
    #[error("store disposed")]
    Disposed,

    /// Local persistence error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<bistro_types::Error> for SyncError {
    fn from(e: bistro_types::Error) -> Self {
        Self::Subscription(e.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Fetch(e.to_string())
        }
    }
}
