//! Search-bar suggestion assembly.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Tuning for the search bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionConfig {
    /// Minimum query length (characters) before matching kicks in.
    pub min_chars: usize,
    /// Maximum number of suggestions returned.
    pub max_suggestions: usize,
    /// Quiet period before a keystroke triggers a lookup (ms).
    pub debounce_ms: u64,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            min_chars: 2,
            max_suggestions: 8,
            debounce_ms: 300,
        }
    }
}

/// Builds the suggestion list for `query`.
///
/// Below `min_chars` the list is recent history followed by popular terms.
/// Otherwise it is history entries containing the query followed by catalog
/// names containing it, matched case-insensitively. Duplicates (ignoring
/// case) keep their first occurrence.
pub fn suggest<H, C, P>(
    query: &str,
    history: &[H],
    catalog_names: &[C],
    popular: &[P],
    config: &SuggestionConfig,
) -> Vec<String>
where
    H: AsRef<str>,
    C: AsRef<str>,
    P: AsRef<str>,
{
    let q = query.trim().to_lowercase();
    let candidates: Vec<&str> = if q.chars().count() < config.min_chars {
        history
            .iter()
            .map(|h| h.as_ref())
            .chain(popular.iter().map(|p| p.as_ref()))
            .collect()
    } else {
        let hit = |s: &&str| s.to_lowercase().contains(&q);
        history
            .iter()
            .map(|h| h.as_ref())
            .filter(hit)
            .chain(catalog_names.iter().map(|c| c.as_ref()).filter(hit))
            .collect()
    };

    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
        .take(config.max_suggestions)
        .map(str::to_string)
        .collect()
}
