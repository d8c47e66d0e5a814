//! Local analytics event log and anonymous session id.

use crate::error::StorageResult;
use crate::kv::KeyValueStore;
use bistro_types::now_iso;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// One tracked interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub name: String,
    #[serde(default)]
    pub properties: serde_json::Value,
    pub session_id: String,
    pub timestamp: String,
}

/// Append-only event log capped at a fixed size, oldest evicted first.
pub struct AnalyticsLog {
    store: Arc<dyn KeyValueStore>,
    events_key: String,
    session_key: String,
    cap: usize,
}

impl AnalyticsLog {
    pub fn new(store: Arc<dyn KeyValueStore>, prefix: &str, cap: usize) -> Self {
        Self {
            store,
            events_key: format!("{prefix}_analytics"),
            session_key: format!("{prefix}_session"),
            cap,
        }
    }

    /// Returns the session id, creating and persisting one on first use.
    pub fn session_id(&self) -> StorageResult<String> {
        if let Some(id) = self.store.get(&self.session_key)? {
            return Ok(id);
        }
        let id = uuid::Uuid::new_v4().to_string();
        self.store.set(&self.session_key, &id)?;
        debug!("Started analytics session {id}");
        Ok(id)
    }

    /// Appends an event, evicting the oldest ones past the cap.
    pub fn track(
        &self,
        name: impl Into<String>,
        properties: serde_json::Value,
    ) -> StorageResult<AnalyticsEvent> {
        let event = AnalyticsEvent {
            name: name.into(),
            properties,
            session_id: self.session_id()?,
            timestamp: now_iso(),
        };

        let mut events = self.events()?;
        events.push(event.clone());
        if events.len() > self.cap {
            let excess = events.len() - self.cap;
            events.drain(..excess);
        }
        self.store
            .set(&self.events_key, &serde_json::to_string(&events)?)?;
        Ok(event)
    }

    /// Logged events, oldest first. A corrupt log reads as empty.
    pub fn events(&self) -> StorageResult<Vec<AnalyticsEvent>> {
        let Some(raw) = self.store.get(&self.events_key)? else {
            return Ok(Vec::new());
        };
        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Ignoring corrupt analytics log: {e}");
            Vec::new()
        }))
    }

    pub fn clear(&self) -> StorageResult<()> {
        self.store.remove(&self.events_key)
    }
}
