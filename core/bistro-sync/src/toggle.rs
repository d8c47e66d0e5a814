//! Optimistic boolean toggles.
//!
//! The local value flips immediately; the remote effect runs in the
//! background alongside a minimum visible duration. If the effect is
//! rejected the local value is restored exactly once. A key with a toggle in
//! flight ignores further toggles until it settles.

use crate::error::SyncResult;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// Toggle timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleConfig {
    /// Shortest time a toggle stays in flight, so progress indicators do not flicker.
    pub min_duration_ms: u64,
}

impl Default for ToggleConfig {
    fn default() -> Self {
        Self {
            min_duration_ms: 300,
        }
    }
}

/// How a toggle settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The effect succeeded; the local value is the carried one.
    Committed(bool),
    /// The effect failed; the local value was restored to the carried one.
    RolledBack(bool),
    /// A toggle for the same key was already in flight; nothing changed.
    Ignored,
}

/// Runs optimistic toggles keyed by `K`. Clones share the in-flight set.
#[derive(Debug, Clone)]
pub struct OptimisticToggle<K> {
    in_flight: Arc<Mutex<HashSet<K>>>,
    min_duration: Duration,
}

/// Clears the in-flight marker for a key when dropped.
struct InFlight<'a, K: Eq + Hash> {
    set: &'a Mutex<HashSet<K>>,
    key: K,
}

impl<K: Eq + Hash> Drop for InFlight<'_, K> {
    fn drop(&mut self) {
        lock(self.set).remove(&self.key);
    }
}

fn lock<K>(set: &Mutex<HashSet<K>>) -> MutexGuard<'_, HashSet<K>> {
    set.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<K: Eq + Hash + Clone + Debug> OptimisticToggle<K> {
    pub fn new(config: &ToggleConfig) -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            min_duration: Duration::from_millis(config.min_duration_ms),
        }
    }

    /// Whether a toggle for `key` has not settled yet.
    pub fn is_in_flight(&self, key: &K) -> bool {
        lock(&self.in_flight).contains(key)
    }

    /// Flips `current` for `key`.
    ///
    /// `set_local` is called with the new value right away and, only if
    /// `effect` fails, once more with `current`. The call resolves no sooner
    /// than the configured minimum duration.
    pub async fn toggle<S, E, Fut>(
        &self,
        key: K,
        current: bool,
        mut set_local: S,
        effect: E,
    ) -> ToggleOutcome
    where
        S: FnMut(bool),
        E: FnOnce(bool) -> Fut,
        Fut: Future<Output = SyncResult<()>>,
    {
        if !lock(&self.in_flight).insert(key.clone()) {
            debug!("Toggle for {:?} already in flight, ignoring", key);
            return ToggleOutcome::Ignored;
        }
        let _guard = InFlight {
            set: &self.in_flight,
            key: key.clone(),
        };

        let next = !current;
        set_local(next);
        let (result, ()) = tokio::join!(effect(next), tokio::time::sleep(self.min_duration));

        match result {
            Ok(()) => {
                debug!("Toggle for {:?} committed as {}", key, next);
                ToggleOutcome::Committed(next)
            }
            Err(e) => {
                warn!("Toggle for {:?} failed, rolling back: {}", key, e);
                set_local(current);
                ToggleOutcome::RolledBack(current)
            }
        }
    }
}
