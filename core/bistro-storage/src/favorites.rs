//! Favorited records grouped by category bucket.

use crate::error::StorageResult;
use crate::kv::KeyValueStore;
use bistro_model::Record;
use bistro_types::RecordId;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Storage key of the favorites blob.
pub const FAVORITES_KEY: &str = "favorites";

/// Buckets every favorite set starts with.
const DEFAULT_BUCKETS: [&str; 4] = ["products", "videos", "images", "articles"];

/// Category bucket → favorited records, kept as the JSON rows they were
/// saved as so one blob can hold products, videos, images and articles.
#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteSet {
    buckets: BTreeMap<String, Vec<Value>>,
}

impl Default for FavoriteSet {
    fn default() -> Self {
        Self {
            buckets: DEFAULT_BUCKETS
                .iter()
                .map(|b| (b.to_string(), Vec::new()))
                .collect(),
        }
    }
}

impl FavoriteSet {
    /// Loads the persisted set, shallow-merged over the defaults.
    ///
    /// Persisted buckets replace default ones wholesale; default buckets the
    /// blob lacks stay empty. A corrupt blob yields the defaults.
    pub fn load(store: &dyn KeyValueStore) -> StorageResult<Self> {
        let mut set = Self::default();
        let Some(raw) = store.get(FAVORITES_KEY)? else {
            return Ok(set);
        };

        let persisted = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                warn!("Ignoring favorites blob of unexpected shape: {other}");
                return Ok(set);
            }
            Err(e) => {
                warn!("Ignoring corrupt favorites blob: {e}");
                return Ok(set);
            }
        };

        for (bucket, items) in persisted {
            match items {
                Value::Array(items) => {
                    set.buckets.insert(bucket, items);
                }
                _ => warn!("Ignoring non-array favorites bucket {bucket}"),
            }
        }
        Ok(set)
    }

    /// Persists the whole set.
    pub fn save(&self, store: &dyn KeyValueStore) -> StorageResult<()> {
        let json = serde_json::to_string(&self.buckets)?;
        store.set(FAVORITES_KEY, &json)
    }

    /// Bucket names, in order.
    pub fn buckets(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    pub fn contains(&self, bucket: &str, id: &RecordId) -> bool {
        self.buckets
            .get(bucket)
            .is_some_and(|items| items.iter().any(|v| RecordId::from_row(v).as_ref() == Some(id)))
    }

    /// Adds `record` to `bucket`. Returns `false` if it was already there.
    pub fn add<R: Record>(&mut self, bucket: &str, record: &R) -> StorageResult<bool> {
        if self.contains(bucket, record.id()) {
            return Ok(false);
        }
        let row = serde_json::to_value(record)?;
        self.buckets.entry(bucket.to_string()).or_default().push(row);
        debug!("Favorited {} in {bucket}", record.id());
        Ok(true)
    }

    /// Removes the record with `id` from `bucket`. Returns whether it was there.
    pub fn remove(&mut self, bucket: &str, id: &RecordId) -> bool {
        let Some(items) = self.buckets.get_mut(bucket) else {
            return false;
        };
        let before = items.len();
        items.retain(|v| RecordId::from_row(v).as_ref() != Some(id));
        before != items.len()
    }

    /// Flips membership of `record`. Returns whether it is now a favorite.
    pub fn toggle<R: Record>(&mut self, bucket: &str, record: &R) -> StorageResult<bool> {
        if self.remove(bucket, record.id()) {
            Ok(false)
        } else {
            self.add(bucket, record)
        }
    }

    /// Favorites of `bucket` decoded as `R`. Rows that no longer decode are skipped.
    pub fn items<R: Record>(&self, bucket: &str) -> Vec<R> {
        self.buckets
            .get(bucket)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| match serde_json::from_value(v.clone()) {
                        Ok(r) => Some(r),
                        Err(e) => {
                            warn!("Skipping undecodable favorite in {bucket}: {e}");
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn count(&self, bucket: &str) -> usize {
        self.buckets.get(bucket).map_or(0, Vec::len)
    }

    pub fn total(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}
