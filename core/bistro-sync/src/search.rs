//! Search-as-you-type suggestions backed by the persisted search history.

use crate::debounce::Debouncer;
use crate::error::SyncResult;
use bistro_query::{SuggestionConfig, suggest};
use bistro_storage::SearchHistory;
use std::time::Duration;
use tracing::debug;

/// Assembles debounced suggestions from history, catalog names and a
/// curated list of popular terms.
pub struct SuggestionService {
    history: SearchHistory,
    popular: Vec<String>,
    config: SuggestionConfig,
    debouncer: Debouncer,
}

impl SuggestionService {
    pub fn new(history: SearchHistory, popular: Vec<String>, config: SuggestionConfig) -> Self {
        let debouncer = Debouncer::new(Duration::from_millis(config.debounce_ms));
        Self {
            history,
            popular,
            config,
            debouncer,
        }
    }

    /// Suggestions for `query`, or `None` if a newer query superseded it
    /// during the quiet period.
    pub async fn suggestions<C: AsRef<str>>(
        &self,
        query: &str,
        catalog_names: &[C],
    ) -> SyncResult<Option<Vec<String>>> {
        let Some(query) = self.debouncer.debounce(query.to_string()).await else {
            debug!("Suggestion query superseded");
            return Ok(None);
        };
        let history = self.history.entries()?;
        Ok(Some(suggest(
            &query,
            &history,
            catalog_names,
            &self.popular,
            &self.config,
        )))
    }

    /// Records a submitted search and drops any pending suggestion lookup.
    pub fn submit(&self, term: &str) -> SyncResult<Vec<String>> {
        self.debouncer.cancel();
        Ok(self.history.record(term)?)
    }

    pub fn history(&self) -> SyncResult<Vec<String>> {
        Ok(self.history.entries()?)
    }
}
