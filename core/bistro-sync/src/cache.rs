//! Change-fed collection cache.
//!
//! A [`ChangeFeedCache`] mirrors one backend table: `load` seeds it from a
//! [`RemoteTable`], `subscribe` keeps it current from a [`ChangeFeed`], and
//! local writes go to the remote table first and are reconciled on success.
//! Consumers read snapshots and listen for [`Notification`]s.

use crate::applicator::{Applied, Collection};
use crate::error::{SyncError, SyncResult};
use crate::feed::ChangeFeed;
use crate::notify::{Notification, Notifier};
use crate::remote::RemoteTable;
use crate::subscription::{Subscription, SubscriptionHandle};
use crate::toggle::{OptimisticToggle, ToggleOutcome};
use bistro_model::{Record, Validate};
use bistro_query::{ListQuery, filter_sort};
use bistro_types::{ChangeEvent, RecordId};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, warn};

/// Which rows a cache holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheScope {
    /// Only rows whose visibility flag is set (public storefront).
    #[default]
    VisibleOnly,
    /// Every row (back office).
    All,
}

/// Cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub scope: CacheScope,
    /// Notifications buffered for a slow listener before it starts lagging.
    pub notification_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            scope: CacheScope::default(),
            notification_capacity: 64,
        }
    }
}

/// State shared between the cache and its subscription task.
struct Shared<R> {
    collection: RwLock<Collection<R>>,
    notifier: Notifier,
    alive: AtomicBool,
}

impl<R: Record> Shared<R> {
    fn read(&self) -> RwLockReadGuard<'_, Collection<R>> {
        self.collection.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Collection<R>> {
        self.collection.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_alive(&self) -> SyncResult<()> {
        if self.alive.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SyncError::Disposed)
        }
    }

    /// Reconciles one event and announces the result.
    ///
    /// An update that changes the primary key is refused with
    /// [`SyncError::Subscription`].
    fn apply(&self, event: ChangeEvent<R>) -> SyncResult<Option<Notification>> {
        self.ensure_alive()?;
        if let ChangeEvent::Update { old, new } = &event {
            if old.id() != new.id() {
                return Err(bistro_types::Error::InvalidPayload(format!(
                    "{} update changes key {} to {}",
                    R::TABLE,
                    old.id(),
                    new.id()
                ))
                .into());
            }
        }
        let applied = self.write().apply(event);
        Ok(applied.map(|applied| self.publish(applied)))
    }

    fn publish(&self, applied: Applied) -> Notification {
        let notification = match applied {
            Applied::Added(name) => Notification::added(R::TABLE, &name),
            Applied::Updated(name) => Notification::updated(R::TABLE, &name),
            Applied::Removed(name) => Notification::removed(R::TABLE, &name),
        };
        self.notifier.publish(notification.clone());
        notification
    }

    /// Sets a row's visibility flag without announcing it. Returns what the
    /// change did to the collection.
    ///
    /// A row that left the collection meanwhile is only brought back when
    /// the scope hides rows by visibility.
    fn set_local_visibility(&self, record: &R, visible: bool) -> Option<Applied> {
        if !self.alive.load(Ordering::SeqCst) {
            return None;
        }
        let mut collection = self.write();
        let current = collection.get(record.id()).cloned();
        if current.is_none() && collection.scope() == CacheScope::All {
            return None;
        }
        let old = current.unwrap_or_else(|| record.clone());
        let mut new = old.clone();
        new.set_visible(visible);
        collection.apply(ChangeEvent::Update { old, new })
    }

    /// Logs an error and publishes it as a notification.
    fn announce(&self, error: SyncError) -> SyncError {
        warn!("{} operation failed: {}", R::TABLE, error);
        self.notifier.publish(Notification::error(R::TABLE, &error));
        error
    }

    /// Reports a failed load or write as [`SyncError::Fetch`].
    fn fail(&self, error: SyncError) -> SyncError {
        match error {
            e @ SyncError::Fetch(_) => self.announce(e),
            other => self.announce(SyncError::Fetch(other.to_string())),
        }
    }
}

/// A live, reconciled mirror of one backend table.
pub struct ChangeFeedCache<R: Record> {
    remote: Arc<dyn RemoteTable<R>>,
    feed: Arc<dyn ChangeFeed>,
    shared: Arc<Shared<R>>,
    subscription: Mutex<Option<SubscriptionHandle>>,
}

impl<R: Record> ChangeFeedCache<R> {
    pub fn new(
        remote: Arc<dyn RemoteTable<R>>,
        feed: Arc<dyn ChangeFeed>,
        config: &CacheConfig,
    ) -> Self {
        Self {
            remote,
            feed,
            shared: Arc::new(Shared {
                collection: RwLock::new(Collection::new(config.scope)),
                notifier: Notifier::new(config.notification_capacity),
                alive: AtomicBool::new(true),
            }),
            subscription: Mutex::new(None),
        }
    }

    /// Subscribes to the change stream, then loads the initial rows.
    pub async fn init(&self) -> SyncResult<()> {
        self.subscribe().await?;
        self.load().await.map(|_| ())
    }

    /// Replaces the collection with a fresh fetch. Returns the row count.
    ///
    /// On failure the collection is left as it was.
    pub async fn load(&self) -> SyncResult<usize> {
        self.shared.ensure_alive()?;
        let scope = self.scope();
        let rows = match self.remote.fetch_all(scope).await {
            Ok(rows) => rows,
            Err(e) => {
                self.shared.ensure_alive()?;
                return Err(self.shared.fail(e));
            }
        };
        self.shared.ensure_alive()?;
        let mut collection = self.shared.write();
        collection.replace_all(rows);
        info!("Loaded {} rows into {}", collection.len(), R::TABLE);
        Ok(collection.len())
    }

    /// Starts applying streamed changes. Calling it again while subscribed
    /// does nothing.
    pub async fn subscribe(&self) -> SyncResult<()> {
        self.shared.ensure_alive()?;
        let mut subscription = self.subscription.lock().await;
        if subscription.as_ref().is_some_and(SubscriptionHandle::is_active) {
            debug!("{} already subscribed", R::TABLE);
            return Ok(());
        }
        let shared = self.shared.clone();
        let handle = Subscription::open(
            self.feed.clone(),
            R::TABLE,
            move |event: ChangeEvent<R>| {
                if let Err(e) = shared.apply(event) {
                    debug!("Skipped streamed change on {}: {}", R::TABLE, e);
                }
                std::future::ready(())
            },
        )
        .await
        .map_err(|e| self.shared.announce(e))?;
        *subscription = Some(handle);
        Ok(())
    }

    /// Reconciles one change into the collection.
    pub fn apply_event(&self, event: ChangeEvent<R>) -> SyncResult<Option<Notification>> {
        self.shared.apply(event)
    }

    /// Flips a row's visibility through `toggle`, writing the new flag to
    /// the remote table. The row is looked up in this cache.
    ///
    /// A committed flip is announced like a streamed update; a rollback is
    /// silent. When the remote table no longer has the row, the rollback
    /// drops it from the cache instead of restoring it and announces the
    /// removal.
    pub async fn set_visibility(
        &self,
        id: &RecordId,
        toggle: &OptimisticToggle<RecordId>,
    ) -> SyncResult<ToggleOutcome> {
        self.shared.ensure_alive()?;
        let record = self
            .get(id)
            .ok_or_else(|| SyncError::NotFound(format!("{}/{id}", R::TABLE)))?;
        let current = record.is_visible();
        let shared = &self.shared;
        let remote = &self.remote;
        let gone = AtomicBool::new(false);
        let pending: StdMutex<Option<Applied>> = StdMutex::new(None);
        let outcome = toggle
            .toggle(
                id.clone(),
                current,
                |visible| {
                    if visible == current && gone.load(Ordering::SeqCst) {
                        return;
                    }
                    let applied = shared.set_local_visibility(&record, visible);
                    *pending.lock().unwrap_or_else(PoisonError::into_inner) = applied;
                },
                |visible| {
                    let mut next = record.clone();
                    next.set_visible(visible);
                    let gone = &gone;
                    async move {
                        match remote.update(&next).await {
                            Ok(_) => Ok(()),
                            Err(e @ SyncError::NotFound(_)) => {
                                gone.store(true, Ordering::SeqCst);
                                Err(e)
                            }
                            Err(e) => Err(SyncError::Toggle(e.to_string())),
                        }
                    }
                },
            )
            .await;
        self.shared.ensure_alive()?;
        let pending = pending.into_inner().unwrap_or_else(PoisonError::into_inner);
        match outcome {
            ToggleOutcome::Committed(_) => {
                if let Some(applied) = pending {
                    self.shared.publish(applied);
                }
            }
            ToggleOutcome::RolledBack(_) if gone.load(Ordering::SeqCst) => {
                let removed = self.shared.write().apply(ChangeEvent::Delete(id.clone()));
                let hidden = pending.filter(|a| matches!(a, Applied::Removed(_)));
                if let Some(applied) = removed.or(hidden) {
                    info!("{} {} no longer exists remotely", R::TABLE, id);
                    self.shared.publish(applied);
                }
            }
            _ => {}
        }
        Ok(outcome)
    }

    /// Current rows in display order.
    pub fn snapshot(&self) -> Vec<R> {
        self.shared.read().rows().to_vec()
    }

    /// Filtered and sorted copy of the current rows.
    pub fn view(&self, query: &ListQuery) -> Vec<R> {
        filter_sort(self.shared.read().rows(), query)
    }

    pub fn get(&self, id: &RecordId) -> Option<R> {
        self.shared.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.shared.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.read().is_empty()
    }

    pub fn scope(&self) -> CacheScope {
        self.shared.read().scope()
    }

    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.shared.notifier.subscribe()
    }

    pub fn is_alive(&self) -> bool {
        self.shared.alive.load(Ordering::SeqCst)
    }

    /// Whether a live subscription is attached.
    pub async fn is_subscribed(&self) -> bool {
        self.subscription
            .lock()
            .await
            .as_ref()
            .is_some_and(SubscriptionHandle::is_active)
    }

    /// Stops the cache. Results of operations still in flight are discarded
    /// and every later call returns [`SyncError::Disposed`].
    pub async fn dispose(&self) {
        if !self.shared.alive.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.subscription.lock().await.take() {
            handle.dispose();
        }
        info!("Disposed {} cache", R::TABLE);
    }
}

impl<R: Record + Validate> ChangeFeedCache<R> {
    /// Validates and inserts a row, then reconciles the stored version.
    pub async fn create(&self, record: R) -> SyncResult<R> {
        self.shared.ensure_alive()?;
        record.validate()?;
        let stored = self
            .remote
            .insert(&record)
            .await
            .map_err(|e| self.write_failed(e))?;
        self.shared.apply(ChangeEvent::Insert(stored.clone()))?;
        Ok(stored)
    }

    /// Validates and replaces a row, then reconciles the stored version.
    pub async fn update(&self, record: R) -> SyncResult<R> {
        self.shared.ensure_alive()?;
        record.validate()?;
        let old = self.get(record.id()).unwrap_or_else(|| record.clone());
        let stored = self
            .remote
            .update(&record)
            .await
            .map_err(|e| self.write_failed(e))?;
        self.shared.apply(ChangeEvent::Update {
            old,
            new: stored.clone(),
        })?;
        Ok(stored)
    }

    /// Deletes a row remotely, then locally. Deleting an absent row is not an error.
    pub async fn delete(&self, id: &RecordId) -> SyncResult<()> {
        self.shared.ensure_alive()?;
        self.remote
            .delete(id)
            .await
            .map_err(|e| self.write_failed(e))?;
        self.shared.apply(ChangeEvent::Delete(id.clone()))?;
        Ok(())
    }

    fn write_failed(&self, error: SyncError) -> SyncError {
        if !self.is_alive() {
            return SyncError::Disposed;
        }
        self.shared.fail(error)
    }
}

impl<R: Record> Drop for ChangeFeedCache<R> {
    fn drop(&mut self) {
        self.shared.alive.store(false, Ordering::SeqCst);
    }
}

