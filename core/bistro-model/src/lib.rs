//! Domain records for Bistro.
//!
//! Defines the types every other subsystem depends on:
//! - [`Record`]: the contract a row type must satisfy to live in a
//!   change-fed collection (identity, category, visibility flag, searchable
//!   text, optional price/cost/popularity, timestamps)
//! - [`Product`], [`Video`], [`GalleryImage`], [`Article`]: the storefront's
//!   tables
//! - [`Validate`] and [`ProductDraft`]: input checks that run before any
//!   remote write

mod article;
mod media;
mod product;
mod record;
mod validation;

pub use article::Article;
pub use media::{GalleryImage, Video};
pub use product::Product;
pub use record::{Record, SearchField};
pub use validation::{ProductDraft, Validate, ValidationError};
