//! Recent search terms.

use crate::error::StorageResult;
use crate::kv::KeyValueStore;
use std::sync::Arc;
use tracing::warn;

/// Storage key of the search history array.
pub const SEARCH_HISTORY_KEY: &str = "searchHistory";

/// Most-recent-first list of search terms, deduplicated ignoring case.
pub struct SearchHistory {
    store: Arc<dyn KeyValueStore>,
    limit: usize,
}

impl SearchHistory {
    pub fn new(store: Arc<dyn KeyValueStore>, limit: usize) -> Self {
        Self { store, limit }
    }

    /// Current entries. A corrupt value reads as empty.
    pub fn entries(&self) -> StorageResult<Vec<String>> {
        let Some(raw) = self.store.get(SEARCH_HISTORY_KEY)? else {
            return Ok(Vec::new());
        };
        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Ignoring corrupt search history: {e}");
            Vec::new()
        }))
    }

    /// Moves `term` to the front, dropping older duplicates and anything
    /// past the limit. Blank terms are ignored. Returns the new entries.
    pub fn record(&self, term: &str) -> StorageResult<Vec<String>> {
        let term = term.trim();
        let mut entries = self.entries()?;
        if term.is_empty() {
            return Ok(entries);
        }
        let lowered = term.to_lowercase();
        entries.retain(|e| e.to_lowercase() != lowered);
        entries.insert(0, term.to_string());
        entries.truncate(self.limit);
        self.write(&entries)?;
        Ok(entries)
    }

    /// Removes `term` (ignoring case).
    pub fn remove(&self, term: &str) -> StorageResult<Vec<String>> {
        let lowered = term.trim().to_lowercase();
        let mut entries = self.entries()?;
        entries.retain(|e| e.to_lowercase() != lowered);
        self.write(&entries)?;
        Ok(entries)
    }

    pub fn clear(&self) -> StorageResult<()> {
        self.store.remove(SEARCH_HISTORY_KEY)
    }

    fn write(&self, entries: &[String]) -> StorageResult<()> {
        self.store
            .set(SEARCH_HISTORY_KEY, &serde_json::to_string(entries)?)
    }
}
