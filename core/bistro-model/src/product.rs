use crate::{Record, SearchField};
use bistro_types::RecordId;
use serde::{Deserialize, Serialize};

/// A menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub price: Option<f64>,
    /// Purchase cost, used for margin reporting in the back office.
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub order_count: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Product {
    /// Creates an available product with only the required fields set.
    pub fn new(id: impl Into<RecordId>, name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            category: category.into(),
            price: None,
            cost: None,
            available: true,
            tags: Vec::new(),
            image_url: None,
            order_count: None,
            created_at: None,
            updated_at: None,
        }
    }
}

impl Record for Product {
    const TABLE: &'static str = "products";
    const VISIBILITY_COLUMN: &'static str = "available";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn is_visible(&self) -> bool {
        self.available
    }

    fn set_visible(&mut self, visible: bool) {
        self.available = visible;
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn search_values(&self, field: SearchField) -> Vec<&str> {
        match field {
            SearchField::Name => vec![self.name.as_str()],
            SearchField::Description => self.description.as_deref().into_iter().collect(),
            SearchField::Tags => self.tags.iter().map(String::as_str).collect(),
            SearchField::Category => vec![self.category.as_str()],
        }
    }

    fn price(&self) -> Option<f64> {
        self.price
    }

    fn cost(&self) -> Option<f64> {
        self.cost
    }

    fn popularity(&self) -> Option<f64> {
        self.order_count.map(|n| n as f64)
    }

    fn created_at(&self) -> Option<&str> {
        self.created_at.as_deref()
    }

    fn updated_at(&self) -> Option<&str> {
        self.updated_at.as_deref()
    }
}
