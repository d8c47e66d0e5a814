//! Process-wide favorites with optimistic, persisted toggles.

use crate::error::{SyncError, SyncResult};
use crate::toggle::{OptimisticToggle, ToggleConfig, ToggleOutcome};
use bistro_model::Record;
use bistro_storage::{FavoriteSet, KeyValueStore};
use bistro_types::RecordId;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::warn;

/// Owns the favorite set. Consumers read snapshots and toggle entries;
/// every toggle is persisted, and rolled back if persisting fails.
pub struct FavoritesProvider {
    set: RwLock<FavoriteSet>,
    store: Arc<dyn KeyValueStore>,
    toggle: OptimisticToggle<(String, RecordId)>,
}

impl FavoritesProvider {
    pub fn load(store: Arc<dyn KeyValueStore>, config: &ToggleConfig) -> SyncResult<Self> {
        let set = FavoriteSet::load(store.as_ref())?;
        Ok(Self {
            set: RwLock::new(set),
            store,
            toggle: OptimisticToggle::new(config),
        })
    }

    pub fn snapshot(&self) -> FavoriteSet {
        self.set.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_favorite(&self, bucket: &str, id: &RecordId) -> bool {
        self.set
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(bucket, id)
    }

    /// Adds `record` to `bucket` or removes it if already there.
    ///
    /// A record that cannot be added to the set rolls back like a failed
    /// save, and nothing is written.
    pub async fn toggle<R: Record>(&self, bucket: &str, record: &R) -> ToggleOutcome {
        let key = (bucket.to_string(), record.id().clone());
        let current = self.is_favorite(bucket, record.id());
        let rejected = Mutex::new(None);
        self.toggle
            .toggle(
                key,
                current,
                |on| {
                    let mut set = self.set.write().unwrap_or_else(PoisonError::into_inner);
                    if on {
                        if let Err(e) = set.add(bucket, record) {
                            warn!("Failed to add {} to {} favorites: {}", record.id(), bucket, e);
                            *rejected.lock().unwrap_or_else(PoisonError::into_inner) = Some(e);
                        }
                    } else {
                        set.remove(bucket, record.id());
                    }
                },
                |_| {
                    let rejected = &rejected;
                    async move {
                        let failed = rejected
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .take();
                        if let Some(e) = failed {
                            return Err(SyncError::from(e));
                        }
                        let snapshot = self.snapshot();
                        snapshot.save(self.store.as_ref()).map_err(SyncError::from)
                    }
                },
            )
            .await
    }
}
