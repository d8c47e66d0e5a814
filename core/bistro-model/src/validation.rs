//! Input validation run before any remote write.
//!
//! Admin forms submit free text. [`ProductDraft`] turns that text into a
//! [`Product`]; [`Validate`] checks a fully-typed record. Both reject bad
//! input with a [`ValidationError`] that names the offending field, so the
//! form can show it inline.

use crate::{Article, GalleryImage, Product, Video};
use bistro_types::RecordId;
use thiserror::Error;

/// Malformed form input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("{field} must be a number, got {value:?}")]
    NotANumber { field: &'static str, value: String },

    #[error("{0} must not be negative")]
    Negative(&'static str),

    #[error("{0} must be an http(s) URL")]
    InvalidUrl(&'static str),
}

/// Checks a record before it is written to the backend.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

impl Validate for Product {
    fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        require("category", &self.category)?;
        non_negative("price", self.price)?;
        non_negative("cost", self.cost)?;
        if let Some(url) = &self.image_url {
            http_url("image_url", url)?;
        }
        Ok(())
    }
}

impl Validate for Video {
    fn validate(&self) -> Result<(), ValidationError> {
        require("title", &self.title)?;
        http_url("url", &self.url)
    }
}

impl Validate for GalleryImage {
    fn validate(&self) -> Result<(), ValidationError> {
        http_url("url", &self.url)
    }
}

impl Validate for Article {
    fn validate(&self) -> Result<(), ValidationError> {
        require("title", &self.title)?;
        require("body", &self.body)
    }
}

/// Product form input as typed by an administrator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: String,
    pub cost: String,
    /// Comma separated.
    pub tags: String,
    pub image_url: String,
    pub available: bool,
}

impl ProductDraft {
    /// Parses the draft into a product with the given id.
    ///
    /// Blank optional fields become `None`; `price` is required.
    pub fn into_product(self, id: RecordId) -> Result<Product, ValidationError> {
        let price = parse_number("price", &self.price)?
            .ok_or(ValidationError::Required("price"))?;
        let cost = parse_number("cost", &self.cost)?;

        let product = Product {
            id,
            name: self.name.trim().to_string(),
            description: non_blank(&self.description),
            category: self.category.trim().to_string(),
            price: Some(price),
            cost,
            available: self.available,
            tags: self
                .tags
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            image_url: non_blank(&self.image_url),
            order_count: None,
            created_at: None,
            updated_at: None,
        };
        product.validate()?;
        Ok(product)
    }
}

impl From<&Product> for ProductDraft {
    fn from(p: &Product) -> Self {
        Self {
            name: p.name.clone(),
            description: p.description.clone().unwrap_or_default(),
            category: p.category.clone(),
            price: p.price.map(|v| v.to_string()).unwrap_or_default(),
            cost: p.cost.map(|v| v.to_string()).unwrap_or_default(),
            tags: p.tags.join(", "),
            image_url: p.image_url.clone().unwrap_or_default(),
            available: p.available,
        }
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(())
    }
}

fn non_negative(field: &'static str, value: Option<f64>) -> Result<(), ValidationError> {
    match value {
        Some(v) if !v.is_finite() => Err(ValidationError::NotANumber {
            field,
            value: v.to_string(),
        }),
        Some(v) if v < 0.0 => Err(ValidationError::Negative(field)),
        _ => Ok(()),
    }
}

fn http_url(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let v = value.trim();
    if v.starts_with("https://") || v.starts_with("http://") {
        Ok(())
    } else {
        Err(ValidationError::InvalidUrl(field))
    }
}

/// Parses a decimal typed with either `.` or `,` as separator.
fn parse_number(field: &'static str, raw: &str) -> Result<Option<f64>, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value: f64 = trimmed
        .replace(',', ".")
        .parse()
        .map_err(|_| ValidationError::NotANumber {
            field,
            value: trimmed.to_string(),
        })?;
    non_negative(field, Some(value))?;
    Ok(Some(value))
}

fn non_blank(s: &str) -> Option<String> {
    let t = s.trim();
    (!t.is_empty()).then(|| t.to_string())
}
