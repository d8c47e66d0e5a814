//! Gallery and video records.

use crate::{Record, SearchField};
use bistro_types::RecordId;
use serde::{Deserialize, Serialize};

/// A promotional or recipe video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: String,
    pub url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub views: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Record for Video {
    const TABLE: &'static str = "videos";
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
            SearchField::Description => self.description.as_deref().into_iter().collect(),
            SearchField::Tags => Vec::new(),
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

/// A gallery photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub id: RecordId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: String,
    pub url: String,
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Record for GalleryImage {
    const TABLE: &'static str = "gallery_images";
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
        if self.title.is_empty() { &self.url } else { &self.title }
    }

    fn search_values(&self, field: SearchField) -> Vec<&str> {
        match field {
            SearchField::Name => vec![self.title.as_str()],
            SearchField::Description => self
                .description
                .as_deref()
                .into_iter()
                .chain(self.alt_text.as_deref())
                .collect(),
            SearchField::Tags => Vec::new(),
            SearchField::Category => vec![self.category.as_str()],
        }
    }

    fn created_at(&self) -> Option<&str> {
        self.created_at.as_deref()
    }

    fn updated_at(&self) -> Option<&str> {
        self.updated_at.as_deref()
    }
}
