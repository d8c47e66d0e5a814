//! Local persistent state for Bistro.
//!
//! A small string key-value store backs everything the storefront keeps on
//! the device between sessions:
//! - favorites: category bucket → favorited records (`favorites`)
//! - search history: most-recent-first terms (`searchHistory`)
//! - analytics event log, capped with oldest evicted (`<prefix>_analytics`)
//! - the anonymous session id (`<prefix>_session`)
//!
//! The store is process-wide and unlocked at the value level: writes are
//! last-writer-wins. Corrupt persisted values are logged and replaced by
//! defaults rather than surfaced as errors.

mod analytics;
mod error;
mod favorites;
mod history;
mod kv;

use serde::{Deserialize, Serialize};

pub use analytics::{AnalyticsEvent, AnalyticsLog};
pub use error::{StorageError, StorageResult};
pub use favorites::{FAVORITES_KEY, FavoriteSet};
pub use history::{SEARCH_HISTORY_KEY, SearchHistory};
pub use kv::{KeyValueStore, MemoryStore, SqliteStore};

/// Configuration for local state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Prefix for the analytics and session keys.
    pub key_prefix: String,
    /// Maximum number of search terms kept.
    pub history_limit: usize,
    /// Maximum number of analytics events kept.
    pub analytics_cap: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            key_prefix: "bistro".to_string(),
            history_limit: 10,
            analytics_cap: 1000,
        }
    }
}
