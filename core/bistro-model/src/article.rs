use crate::{Record, SearchField};
use bistro_types::RecordId;
use serde::{Deserialize, Serialize};

/// A news post shown on the storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub views: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Record for Article {
    const TABLE: &'static str = "news";
    const VISIBILITY_COLUMN: &'static str = "published";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn is_visible(&self) -> bool {
        self.published
    }

    fn set_visible(&mut self, visible: bool) {
        self.published = visible;
    }

    fn display_name(&self) -> &str {
        &self.title
    }

    fn search_values(&self, field: SearchField) -> Vec<&str> {
        match field {
            SearchField::Name => vec![self.title.as_str()],
            SearchField::Description => {
                let mut values: Vec<&str> = self.summary.as_deref().into_iter().collect();
                values.push(&self.body);
                values
            }
            SearchField::Tags => self.tags.iter().map(String::as_str).collect(),
            SearchField::Category => vec![self.category.as_str()],
        }
    }

    fn popularity(&self) -> Option<f64> {
        self.views.map(|n| n as f64)
    }

    fn created_at(&self) -> Option<&str> {
        self.created_at.as_deref()
    }

    fn updated_at(&self) -> Option<&str> {
        self.updated_at.as_deref()
    }
}
