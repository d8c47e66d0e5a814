//! Pure derivations over in-memory collections.
//!
//! - [`filter_sort`] turns a cached collection plus a [`ListQuery`]
//!   (category, free text, price range, sort key) into the list a view shows
//! - [`suggest`] assembles search-bar suggestions from history, catalog
//!   names and popular terms
//!
//! Nothing here mutates its input or performs I/O: identical inputs give
//! identical, order-stable outputs.

mod filter;
mod sort;
mod suggest;

pub use filter::{CategoryFilter, ListQuery, PriceRange, filter_sort};
pub use sort::{SortKey, margin, sort_records};
pub use suggest::{SuggestionConfig, suggest};
