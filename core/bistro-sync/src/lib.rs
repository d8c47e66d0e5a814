//! Live data layer for Bistro.
//!
//! Keeps in-memory collections of backend tables current and lets the UI
//! mutate them optimistically.
//!
//! # Architecture
//!
//! ## Components
//!
//! - **Feed**: [`ChangeFeed`] delivers raw change payloads per table
//! - **Subscription**: decodes payloads into [`bistro_types::ChangeEvent`]s
//!   on a dedicated task and owns the feed connection
//! - **Cache**: [`ChangeFeedCache`] reconciles events into a collection and
//!   announces every change as a [`Notification`]
//! - **Remote**: [`RemoteTable`] reads and writes the hosted backend
//! - **Toggle**: [`OptimisticToggle`] flips booleans locally first and rolls
//!   back on rejection
//! - **Search**, **Favorites**, **Geo**: debounced suggestions, persisted
//!   favorites, and best-effort location
//!
//! ## Data flow
//!
//! 1. **Load**: the cache fetches every row in its scope
//! 2. **Subscribe**: changes stream in and are applied in arrival order
//! 3. **Write**: local writes hit the remote table, then the stored row is
//!    reconciled; the feed's echo of the same write is a no-op
//! 4. **Dispose**: the subscription is released and late results dropped
//!
//! # Example
//!
//! ```
//! use bistro_model::Product;
//! use bistro_sync::mock::MemoryTable;
//! use bistro_sync::{CacheConfig, ChangeFeedCache, ChannelFeed};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> bistro_sync::SyncResult<()> {
//! let feed = Arc::new(ChannelFeed::new());
//! let table = Arc::new(MemoryTable::<Product>::new().with_feed(feed.clone()));
//! let cache = ChangeFeedCache::new(table, feed, &CacheConfig::default());
//!
//! cache.init().await?;
//! assert!(cache.is_empty());
//! cache.dispose().await;
//! # Ok(())
//! # }
//! ```

pub mod applicator;
mod cache;
mod debounce;
mod error;
mod favorites;
pub mod feed;
pub mod geo;
mod notify;
pub mod remote;
mod search;
mod subscription;
mod toggle;

pub use applicator::{Applied, Collection};
pub use cache::{CacheConfig, CacheScope, ChangeFeedCache};
pub use debounce::Debouncer;
pub use error::{SyncError, SyncResult};
pub use favorites::FavoritesProvider;
pub use feed::{ChangeFeed, ChannelFeed, ConnectionId, FeedConnection};
pub use geo::{
    Coordinates, GeoConfig, Geolocator, HttpIpLocator, HttpReverseGeocoder, IpLocator, Location,
    LocationSource, PositionSource, ReverseGeocoder,
};
pub use notify::{Notification, NotificationKind, Notifier};
pub use remote::{BackendConfig, RemoteTable, RestTable, mock};
pub use search::SuggestionService;
pub use subscription::{Subscription, SubscriptionHandle};
pub use toggle::{OptimisticToggle, ToggleConfig, ToggleOutcome};
