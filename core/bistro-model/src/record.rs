use bistro_types::RecordId;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A text field a record exposes to free-text search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    /// Product name or media/article title.
    Name,
    Description,
    Tags,
    Category,
}

impl SearchField {
    /// The fields searched when a query does not name any.
    pub const DEFAULT: [SearchField; 3] = [Self::Name, Self::Description, Self::Tags];
}

/// A row held in a change-fed collection.
///
/// Identity is [`Record::id`]; two records with the same id are the same
/// row at different points in time. The visibility flag (`available` for
/// products, `published` for media and news) gates whether a row appears
/// in the public storefront.
pub trait Record: Clone + PartialEq + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Backend table name.
    const TABLE: &'static str;

    /// Column holding the visibility flag.
    const VISIBILITY_COLUMN: &'static str;

    fn id(&self) -> &RecordId;

    fn category(&self) -> &str;

    fn is_visible(&self) -> bool;

    fn set_visible(&mut self, visible: bool);

    /// Human-readable name used in notifications.
    fn display_name(&self) -> &str;

    /// Values matched by free-text search for `field`. Empty when the record
    /// has no such field.
    fn search_values(&self, field: SearchField) -> Vec<&str>;

    fn price(&self) -> Option<f64> {
        None
    }

    fn cost(&self) -> Option<f64> {
        None
    }

    /// Popularity signal (order count, view count).
    fn popularity(&self) -> Option<f64> {
        None
    }

    /// Raw ISO-8601 creation timestamp as stored by the backend.
    fn created_at(&self) -> Option<&str>;

    fn updated_at(&self) -> Option<&str> {
        None
    }
}
