//! List-view filtering: category, free text and price range, followed by
//! the requested sort.

use crate::sort::{SortKey, sort_records};
use bistro_model::{Record, SearchField};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::str::FromStr;

/// Category selection for a list view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryFilter {
    /// The `"all"` sentinel: no category filtering.
    #[default]
    All,
    /// Exact match on the record's category.
    Only(String),
}

impl CategoryFilter {
    const ALL: &'static str = "all";

    pub fn matches(&self, category: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(c) => c == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

impl From<String> for CategoryFilter {
    fn from(s: String) -> Self {
        if s == Self::ALL { Self::All } else { Self::Only(s) }
    }
}

impl From<&str> for CategoryFilter {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<CategoryFilter> for String {
    fn from(f: CategoryFilter) -> Self {
        match f {
            CategoryFilter::All => CategoryFilter::ALL.to_string(),
            CategoryFilter::Only(c) => c,
        }
    }
}

/// Inclusive price bounds. A record without a price is priced at zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn contains(&self, price: Option<f64>) -> bool {
        let p = price.unwrap_or(0.0);
        p >= self.min && p <= self.max
    }
}

/// Everything a list view needs to derive its displayed subset.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub category: CategoryFilter,
    pub text: String,
    pub sort: SortKey,
    pub price_range: Option<PriceRange>,
    /// Fields the text query is matched against.
    pub fields: Vec<SearchField>,
    /// Queries shorter than this (in characters, after trimming) do not filter.
    pub min_query_len: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            category: CategoryFilter::All,
            text: String::new(),
            sort: SortKey::default(),
            price_range: None,
            fields: SearchField::DEFAULT.to_vec(),
            min_query_len: 0,
        }
    }
}

impl ListQuery {
    /// Shorthand for the common `(category, text, sort)` triple.
    pub fn new(category: impl Into<CategoryFilter>, text: impl Into<String>, sort: SortKey) -> Self {
        Self {
            category: category.into(),
            text: text.into(),
            sort,
            ..Default::default()
        }
    }

    pub fn with_price_range(mut self, min: f64, max: f64) -> Self {
        self.price_range = Some(PriceRange { min, max });
        self
    }

    pub fn with_fields(mut self, fields: impl IntoIterator<Item = SearchField>) -> Self {
        self.fields = fields.into_iter().collect();
        self
    }

    pub fn with_min_query_len(mut self, len: usize) -> Self {
        self.min_query_len = len;
        self
    }

    /// The lowercased needle, or `None` when the text query is inactive.
    fn needle(&self) -> Option<String> {
        let t = self.text.trim();
        if t.is_empty() || t.chars().count() < self.min_query_len {
            None
        } else {
            Some(t.to_lowercase())
        }
    }

    fn matches<R: Record>(&self, record: &R, needle: Option<&str>) -> bool {
        if !self.category.matches(record.category()) {
            return false;
        }
        if let Some(range) = &self.price_range {
            if !range.contains(record.price()) {
                return false;
            }
        }
        match needle {
            None => true,
            Some(n) => self.fields.iter().any(|&field| {
                record
                    .search_values(field)
                    .iter()
                    .any(|v| v.to_lowercase().contains(n))
            }),
        }
    }
}

/// Derives the displayed list from a collection.
///
/// Returns a fresh vector; the source is never reordered. Ties under the
/// sort key keep their collection order.
pub fn filter_sort<R: Record>(records: &[R], query: &ListQuery) -> Vec<R> {
    let needle = query.needle();
    let mut out: Vec<R> = records
        .iter()
        .filter(|r| query.matches(*r, needle.as_deref()))
        .cloned()
        .collect();
    sort_records(&mut out, query.sort);
    out
}
