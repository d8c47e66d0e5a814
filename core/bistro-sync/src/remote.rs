//! Remote table access.
//!
//! [`RemoteTable`] is the seam between change-fed caches and the hosted
//! backend. [`RestTable`] talks to a PostgREST-style endpoint over HTTPS;
//! [`mock::MemoryTable`] keeps rows in memory and publishes change payloads
//! the way the hosted backend does.

use crate::cache::CacheScope;
use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use bistro_model::Record;
use bistro_types::RecordId;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::time::Duration;
use tracing::{debug, info};

/// Read and write access to one backend table.
#[async_trait]
pub trait RemoteTable<R: Record>: Send + Sync {
    /// Fetches every row in `scope`, newest first.
    async fn fetch_all(&self, scope: CacheScope) -> SyncResult<Vec<R>>;

    /// Inserts a row and returns it as stored.
    async fn insert(&self, record: &R) -> SyncResult<R>;

    /// Replaces the row with `record.id()` and returns it as stored.
    async fn update(&self, record: &R) -> SyncResult<R>;

    async fn delete(&self, id: &RecordId) -> SyncResult<()>;
}

/// Connection settings for the hosted backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub base_url: String,
    /// Anonymous or service API key, sent as `apikey` and bearer token.
    pub api_key: String,
    /// Path of the REST interface below `base_url`.
    pub rest_path: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            api_key: String::new(),
            rest_path: "rest/v1".to_string(),
            timeout_secs: 10,
        }
    }
}

/// [`RemoteTable`] over the backend's REST interface.
pub struct RestTable<R> {
    config: BackendConfig,
    client: Client,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> RestTable<R> {
    pub fn new(config: BackendConfig) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SyncError::Fetch(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            config,
            client,
            _record: PhantomData,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.rest_path.trim_matches('/'),
            urlencoding::encode(R::TABLE)
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    async fn rows(&self, response: Response, action: &str) -> SyncResult<Vec<R>> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Fetch(format!(
                "{action} {} failed ({status}): {body}",
                R::TABLE
            )));
        }
        response
            .json()
            .await
            .map_err(|e| SyncError::Fetch(format!("failed to parse {} rows: {e}", R::TABLE)))
    }

    async fn single(&self, response: Response, action: &str, id: &RecordId) -> SyncResult<R> {
        self.rows(response, action)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SyncError::NotFound(format!("{}/{id}", R::TABLE)))
    }
}

#[async_trait]
impl<R: Record> RemoteTable<R> for RestTable<R> {
    async fn fetch_all(&self, scope: CacheScope) -> SyncResult<Vec<R>> {
        let mut query = vec![
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
        ];
        if scope == CacheScope::VisibleOnly {
            query.push((R::VISIBILITY_COLUMN, "eq.true".to_string()));
        }
        let response = self
            .authorized(self.client.get(self.url()))
            .query(&query)
            .send()
            .await?;
        let rows = self.rows(response, "fetch").await?;
        info!("Fetched {} rows from {}", rows.len(), R::TABLE);
        Ok(rows)
    }

    async fn insert(&self, record: &R) -> SyncResult<R> {
        let response = self
            .authorized(self.client.post(self.url()))
            .header("Prefer", "return=representation")
            .json(record)
            .send()
            .await?;
        let stored = self.single(response, "insert into", record.id()).await?;
        debug!("Inserted {} into {}", stored.id(), R::TABLE);
        Ok(stored)
    }

    async fn update(&self, record: &R) -> SyncResult<R> {
        let response = self
            .authorized(self.client.patch(self.url()))
            .header("Prefer", "return=representation")
            .query(&[("id", format!("eq.{}", record.id()))])
            .json(record)
            .send()
            .await?;
        let stored = self.single(response, "update", record.id()).await?;
        debug!("Updated {} in {}", stored.id(), R::TABLE);
        Ok(stored)
    }

    async fn delete(&self, id: &RecordId) -> SyncResult<()> {
        let response = self
            .authorized(self.client.delete(self.url()))
            .query(&[("id", format!("eq.{id}"))])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Fetch(format!(
                "delete from {} failed ({status}): {body}",
                R::TABLE
            )));
        }
        debug!("Deleted {} from {}", id, R::TABLE);
        Ok(())
    }
}

/// An in-memory backend for testing and offline demos.
pub mod mock {
    use super::*;
    use crate::feed::ChannelFeed;
    use bistro_types::ChangeEvent;
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
    use tokio::sync::Notify;

    struct State<R> {
        rows: Vec<R>,
        failure: Option<String>,
        hold: Option<Arc<Notify>>,
    }

    /// Rows kept in memory, newest first.
    ///
    /// Every successful write is published on the attached feed as the
    /// hosted backend would, so caches subscribed to the feed observe their
    /// own writes echoed back.
    pub struct MemoryTable<R> {
        state: Mutex<State<R>>,
        feed: Option<Arc<ChannelFeed>>,
    }

    impl<R: Record> MemoryTable<R> {
        pub fn new() -> Self {
            Self::with_rows(Vec::new())
        }

        pub fn with_rows(rows: Vec<R>) -> Self {
            Self {
                state: Mutex::new(State {
                    rows,
                    failure: None,
                    hold: None,
                }),
                feed: None,
            }
        }

        /// Publishes a change payload on `feed` after every write.
        pub fn with_feed(mut self, feed: Arc<ChannelFeed>) -> Self {
            self.feed = Some(feed);
            self
        }

        fn state(&self) -> MutexGuard<'_, State<R>> {
            self.state.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Makes every operation fail with `reason` until [`Self::recover`].
        pub fn fail_with(&self, reason: &str) {
            self.state().failure = Some(reason.to_string());
        }

        pub fn recover(&self) {
            self.state().failure = None;
        }

        /// Parks subsequent fetches until the returned handle is notified.
        pub fn hold_fetches(&self) -> Arc<Notify> {
            let notify = Arc::new(Notify::new());
            self.state().hold = Some(notify.clone());
            notify
        }

        pub fn rows(&self) -> Vec<R> {
            self.state().rows.clone()
        }

        fn check(&self) -> SyncResult<()> {
            match &self.state().failure {
                Some(reason) => Err(SyncError::Fetch(reason.clone())),
                None => Ok(()),
            }
        }

        fn echo(&self, event: ChangeEvent<R>) -> SyncResult<()> {
            if let Some(feed) = &self.feed {
                feed.publish_event(R::TABLE, &event)?;
            }
            Ok(())
        }
    }

    impl<R: Record> Default for MemoryTable<R> {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl<R: Record> RemoteTable<R> for MemoryTable<R> {
        async fn fetch_all(&self, scope: CacheScope) -> SyncResult<Vec<R>> {
            let hold = self.state().hold.take();
            if let Some(hold) = hold {
                hold.notified().await;
            }
            self.check()?;
            Ok(self
                .rows()
                .into_iter()
                .filter(|r| scope == CacheScope::All || r.is_visible())
                .collect())
        }

        async fn insert(&self, record: &R) -> SyncResult<R> {
            self.check()?;
            {
                let mut state = self.state();
                if state.rows.iter().any(|r| r.id() == record.id()) {
                    return Err(SyncError::Fetch(format!(
                        "duplicate key {} in {}",
                        record.id(),
                        R::TABLE
                    )));
                }
                state.rows.insert(0, record.clone());
            }
            self.echo(ChangeEvent::Insert(record.clone()))?;
            Ok(record.clone())
        }

        async fn update(&self, record: &R) -> SyncResult<R> {
            self.check()?;
            let old = {
                let mut state = self.state();
                let slot = state
                    .rows
                    .iter_mut()
                    .find(|r| r.id() == record.id())
                    .ok_or_else(|| SyncError::NotFound(format!("{}/{}", R::TABLE, record.id())))?;
                std::mem::replace(slot, record.clone())
            };
            self.echo(ChangeEvent::Update {
                old,
                new: record.clone(),
            })?;
            Ok(record.clone())
        }

        async fn delete(&self, id: &RecordId) -> SyncResult<()> {
            self.check()?;
            let removed = {
                let mut state = self.state();
                let before = state.rows.len();
                state.rows.retain(|r| r.id() != id);
                state.rows.len() != before
            };
            if removed {
                self.echo(ChangeEvent::<R>::Delete(id.clone()))?;
            }
            Ok(())
        }
    }
}
