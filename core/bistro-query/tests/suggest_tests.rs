use bistro_query::{SuggestionConfig, suggest};
use pretty_assertions::assert_eq;

const NO_NAMES: [&str; 0] = [];

#[test]
fn history_ranking_matches_query() {
    let history = vec!["pizza".to_string(), "pasta".to_string()];
    let out = suggest("piz", &history, &NO_NAMES, &NO_NAMES, &SuggestionConfig::default());
    assert!(out.contains(&"pizza".to_string()));
    assert!(!out.contains(&"pasta".to_string()));
}

#[test]
fn matching_is_case_insensitive() {
    let history = ["Pizza Diavola"];
    let out = suggest("PIZ", &history, &NO_NAMES, &NO_NAMES, &SuggestionConfig::default());
    assert_eq!(out, vec!["Pizza Diavola"]);
}

#[test]
fn short_query_returns_history_then_popular() {
    let history = ["carbonara"];
    let popular = ["margherita", "Carbonara", "tiramisu"];
    let out = suggest("p", &history, &["pizza"], &popular, &SuggestionConfig::default());
    assert_eq!(out, vec!["carbonara", "margherita", "tiramisu"]);
}

#[test]
fn history_comes_before_catalog_and_duplicates_collapse() {
    let history = ["pizza diavola"];
    let catalog = ["Pizza Diavola", "Pizza Margherita", "Pasta"];
    let out = suggest("pizza", &history, &catalog, &NO_NAMES, &SuggestionConfig::default());
    assert_eq!(out, vec!["pizza diavola", "Pizza Margherita"]);
}

#[test]
fn suggestions_are_capped() {
    let catalog: Vec<String> = (0..20).map(|i| format!("pizza {i}")).collect();
    let config = SuggestionConfig {
        max_suggestions: 3,
        ..Default::default()
    };
    let out = suggest("pizza", &NO_NAMES, &catalog, &NO_NAMES, &config);
    assert_eq!(out, vec!["pizza 0", "pizza 1", "pizza 2"]);
}

#[test]
fn blank_entries_are_skipped() {
    let history = ["  ", "pizza"];
    let out = suggest("", &history, &NO_NAMES, &NO_NAMES, &SuggestionConfig::default());
    assert_eq!(out, vec!["pizza"]);
}

#[test]
fn default_config() {
    let c = SuggestionConfig::default();
    assert_eq!(c.min_chars, 2);
    assert_eq!(c.max_suggestions, 8);
    assert_eq!(c.debounce_ms, 300);
}
