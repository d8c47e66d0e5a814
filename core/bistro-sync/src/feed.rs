//! Change stream abstraction.
//!
//! A [`ChangeFeed`] hands out one connection per table subscription. Each
//! connection yields raw JSON payloads in the hosted backend's wire shape
//! (`{eventType, new, old}`); decoding happens in the subscription task so
//! that one malformed payload never ends the stream.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use bistro_types::ChangeEvent;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::debug;

/// Identifies one open connection on a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// An open subscription to one table's changes.
#[derive(Debug)]
pub struct FeedConnection {
    pub id: ConnectionId,
    pub table: String,
    /// Raw payloads in arrival order. Ends when the feed drops the connection.
    pub events: mpsc::UnboundedReceiver<String>,
}

/// A source of table change events.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Opens a connection delivering every change to `table`.
    async fn connect(&self, table: &str) -> SyncResult<FeedConnection>;

    /// Releases a connection. Unknown ids are ignored.
    fn disconnect(&self, id: ConnectionId);
}

#[derive(Default)]
struct Hub {
    next_id: u64,
    connections: HashMap<ConnectionId, (String, mpsc::UnboundedSender<String>)>,
    disconnects: usize,
    refuse: Option<String>,
}

/// In-process change feed.
///
/// Writers call [`ChannelFeed::publish`]; every open connection for the
/// table receives the payload. Used by the in-memory backend and in tests.
#[derive(Default)]
pub struct ChannelFeed {
    hub: Mutex<Hub>,
}

impl ChannelFeed {
    pub fn new() -> Self {
        Self::default()
    }

    fn hub(&self) -> MutexGuard<'_, Hub> {
        self.hub.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Delivers a raw payload to every connection on `table`.
    /// Returns how many connections received it.
    pub fn publish(&self, table: &str, payload: &str) -> usize {
        let mut hub = self.hub();
        let mut delivered = 0;
        hub.connections.retain(|_, (t, tx)| {
            if t.as_str() != table {
                return true;
            }
            match tx.send(payload.to_string()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => false,
            }
        });
        debug!("Published change on {} to {} connection(s)", table, delivered);
        delivered
    }

    /// Encodes `event` in wire form and publishes it.
    pub fn publish_event<R: Serialize>(
        &self,
        table: &str,
        event: &ChangeEvent<R>,
    ) -> SyncResult<usize> {
        let payload = serde_json::to_string(&event.to_payload(table)?)?;
        Ok(self.publish(table, &payload))
    }

    /// Makes subsequent `connect` calls fail with `reason`.
    pub fn refuse_connections(&self, reason: &str) {
        self.hub().refuse = Some(reason.to_string());
    }

    pub fn accept_connections(&self) {
        self.hub().refuse = None;
    }

    /// Drops every open connection, ending their streams.
    pub fn close_all(&self) {
        self.hub().connections.clear();
    }

    /// Number of connections currently open.
    pub fn open_connections(&self) -> usize {
        self.hub().connections.len()
    }

    /// Number of explicit `disconnect` calls that released a connection.
    pub fn disconnects(&self) -> usize {
        self.hub().disconnects
    }
}

#[async_trait]
impl ChangeFeed for ChannelFeed {
    async fn connect(&self, table: &str) -> SyncResult<FeedConnection> {
        let mut hub = self.hub();
        if let Some(reason) = &hub.refuse {
            return Err(SyncError::Subscription(reason.clone()));
        }
        hub.next_id += 1;
        let id = ConnectionId(hub.next_id);
        let (tx, rx) = mpsc::unbounded_channel();
        hub.connections.insert(id, (table.to_string(), tx));
        debug!("Opened {} on {}", id, table);
        Ok(FeedConnection {
            id,
            table: table.to_string(),
            events: rx,
        })
    }

    fn disconnect(&self, id: ConnectionId) {
        let mut hub = self.hub();
        if hub.connections.remove(&id).is_some() {
            hub.disconnects += 1;
            debug!("Closed {}", id);
        }
    }
}
