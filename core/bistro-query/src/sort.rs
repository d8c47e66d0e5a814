use bistro_model::Record;
use bistro_types::parse_instant;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sort orders offered by list views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    NameAsc,
    PriceAsc,
    PriceDesc,
    Newest,
    Oldest,
    MostPopular,
    /// Highest gross margin first (back office).
    MarginDesc,
}

/// Gross margin as a fraction of price.
///
/// A missing cost or a price that is missing or not positive yields `0.0`,
/// so the result is always finite.
pub fn margin<R: Record>(record: &R) -> f64 {
    match (record.price(), record.cost()) {
        (Some(price), Some(cost)) if price > 0.0 && price.is_finite() && cost.is_finite() => {
            (price - cost) / price
        }
        _ => 0.0,
    }
}

fn number(v: Option<f64>) -> f64 {
    v.filter(|n| n.is_finite()).unwrap_or(0.0)
}

/// Milliseconds since the epoch; unparseable or missing timestamps sort as the epoch.
fn instant(v: Option<&str>) -> i64 {
    v.and_then(parse_instant)
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}

/// Stable in-place sort of `records` by `key`.
pub fn sort_records<R: Record>(records: &mut [R], key: SortKey) {
    let cmp: fn(&R, &R) -> Ordering = match key {
        SortKey::NameAsc => |a, b| {
            a.display_name()
                .to_lowercase()
                .cmp(&b.display_name().to_lowercase())
        },
        SortKey::PriceAsc => |a, b| number(a.price()).total_cmp(&number(b.price())),
        SortKey::PriceDesc => |a, b| number(b.price()).total_cmp(&number(a.price())),
        SortKey::Newest => |a, b| instant(b.created_at()).cmp(&instant(a.created_at())),
        SortKey::Oldest => |a, b| instant(a.created_at()).cmp(&instant(b.created_at())),
        SortKey::MostPopular => {
            |a, b| number(b.popularity()).total_cmp(&number(a.popularity()))
        }
        SortKey::MarginDesc => |a, b| margin(b).total_cmp(&margin(a)),
    };
    records.sort_by(cmp);
}
