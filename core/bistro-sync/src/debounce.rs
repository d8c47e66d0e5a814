//! Trailing-edge debouncing for keystroke-driven lookups.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Lets only the last of a burst of calls through.
///
/// Each [`Debouncer::debounce`] call waits for the quiet period and then
/// resolves to `Some(value)` if no newer call arrived meanwhile, `None`
/// otherwise. Clones share the same generation counter.
#[derive(Debug, Clone)]
pub struct Debouncer {
    generation: Arc<AtomicU64>,
    delay: Duration,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            generation: Arc::new(AtomicU64::new(0)),
            delay,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub async fn debounce<T>(&self, value: T) -> Option<T> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        (self.generation.load(Ordering::SeqCst) == ticket).then_some(value)
    }

    /// Supersedes every pending call.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(300))
    }
}
