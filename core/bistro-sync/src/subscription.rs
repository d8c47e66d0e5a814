//! Live subscriptions to a table's change stream.
//!
//! [`Subscription::open`] connects to a [`ChangeFeed`] and spawns one task
//! that decodes payloads and hands them to a callback in arrival order. The
//! returned [`SubscriptionHandle`] owns the connection: it is released
//! exactly once, whether the handle is disposed, dropped, or the stream ends
//! on its own.

use crate::error::SyncResult;
use crate::feed::{ChangeFeed, ConnectionId};
use bistro_types::ChangeEvent;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Releases a feed connection at most once.
struct Lease {
    feed: Arc<dyn ChangeFeed>,
    id: ConnectionId,
    released: AtomicBool,
}

impl Lease {
    fn release(&self) {
        if !self.released.swap(true, Ordering::SeqCst) {
            self.feed.disconnect(self.id);
        }
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.release();
    }
}

/// Entry point for opening subscriptions.
pub struct Subscription;

impl Subscription {
    /// Connects to `table` on `feed` and invokes `on_event` for every
    /// decoded change.
    ///
    /// Payloads that fail to decode are logged and dropped; the stream
    /// continues with the next one.
    pub async fn open<R, F, Fut>(
        feed: Arc<dyn ChangeFeed>,
        table: &str,
        mut on_event: F,
    ) -> SyncResult<SubscriptionHandle>
    where
        R: DeserializeOwned + Clone + Send + 'static,
        F: FnMut(ChangeEvent<R>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let connection = feed.connect(table).await?;
        let lease = Arc::new(Lease {
            feed,
            id: connection.id,
            released: AtomicBool::new(false),
        });
        let dropped = Arc::new(AtomicU64::new(0));
        info!("Subscribed to {} ({})", table, connection.id);

        let task_lease = lease.clone();
        let task_dropped = dropped.clone();
        let table_name = connection.table;
        let mut events = connection.events;
        let task = tokio::spawn(async move {
            while let Some(raw) = events.recv().await {
                match ChangeEvent::<R>::from_json(&raw) {
                    Ok(event) => {
                        debug!("Received {} on {}", event.kind(), table_name);
                        on_event(event).await;
                    }
                    Err(e) => {
                        task_dropped.fetch_add(1, Ordering::Relaxed);
                        warn!("Dropping invalid change on {}: {}", table_name, e);
                    }
                }
            }
            debug!("Change stream for {} ended", table_name);
            task_lease.release();
        });

        Ok(SubscriptionHandle {
            table: table.to_string(),
            lease,
            task: Some(task),
            dropped,
        })
    }
}

/// Owner of a running subscription.
pub struct SubscriptionHandle {
    table: String,
    lease: Arc<Lease>,
    task: Option<JoinHandle<()>>,
    dropped: Arc<AtomicU64>,
}

impl SubscriptionHandle {
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Whether the stream is still being consumed.
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Payloads dropped because they failed to decode.
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stops the task and releases the connection.
    pub fn dispose(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("Unsubscribed from {}", self.table);
        }
        self.lease.release();
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
