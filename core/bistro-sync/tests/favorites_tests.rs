use bistro_model::{Product, Record, SearchField, Video};
use bistro_storage::{FAVORITES_KEY, KeyValueStore, MemoryStore, StorageError, StorageResult};
use bistro_sync::{FavoritesProvider, ToggleConfig, ToggleOutcome};
use bistro_types::RecordId;
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize, Serializer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A store whose writes can be made to fail.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    reject_writes: AtomicBool,
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StorageError::InvalidData("disk full".into()));
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.inner.remove(key)
    }
}

fn config() -> ToggleConfig {
    ToggleConfig { min_duration_ms: 0 }
}

fn pizza() -> Product {
    Product::new(1, "Margherita", "pizzas")
}

// ── FavoritesProvider ───────────────────────────────────────────

#[tokio::test]
async fn toggle_adds_and_persists() {
    let store = Arc::new(FlakyStore::default());
    let favorites = FavoritesProvider::load(store.clone(), &config()).unwrap();

    let outcome = favorites.toggle("products", &pizza()).await;

    assert_eq!(outcome, ToggleOutcome::Committed(true));
    assert!(favorites.is_favorite("products", &RecordId::int(1)));
    let reloaded = FavoritesProvider::load(store, &config()).unwrap();
    assert_eq!(reloaded.snapshot().items::<Product>("products"), vec![pizza()]);
}

#[tokio::test]
async fn toggle_twice_removes() {
    let store = Arc::new(FlakyStore::default());
    let favorites = FavoritesProvider::load(store.clone(), &config()).unwrap();

    favorites.toggle("products", &pizza()).await;
    let outcome = favorites.toggle("products", &pizza()).await;

    assert_eq!(outcome, ToggleOutcome::Committed(false));
    assert_eq!(favorites.snapshot().count("products"), 0);
    assert!(store.get(FAVORITES_KEY).unwrap().is_some());
}

#[tokio::test]
async fn failed_persist_rolls_back() {
    let store = Arc::new(FlakyStore::default());
    let favorites = FavoritesProvider::load(store.clone(), &config()).unwrap();
    store.reject_writes.store(true, Ordering::SeqCst);

    let outcome = favorites.toggle("products", &pizza()).await;

    assert_eq!(outcome, ToggleOutcome::RolledBack(false));
    assert!(!favorites.is_favorite("products", &RecordId::int(1)));
    assert!(store.get(FAVORITES_KEY).unwrap().is_none());
}

#[tokio::test]
async fn buckets_are_independent() {
    let store = Arc::new(FlakyStore::default());
    let favorites = FavoritesProvider::load(store, &config()).unwrap();
    let video = Video {
        id: RecordId::text("v1"),
        title: "Dough 101".into(),
        description: None,
        category: "howto".into(),
        url: "https://cdn.test/v1.mp4".into(),
        thumbnail_url: None,
        published: true,
        views: None,
        created_at: None,
        updated_at: None,
    };

    favorites.toggle("products", &pizza()).await;
    favorites.toggle("videos", &video).await;

    let snapshot = favorites.snapshot();
    assert_eq!(snapshot.count("products"), 1);
    assert_eq!(snapshot.count("videos"), 1);
    assert!(!favorites.is_favorite("videos", &RecordId::int(1)));
}

// ── Unstorable records ──────────────────────────────────────────

/// A row that refuses to serialize.
#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Opaque {
    id: RecordId,
}

impl Serialize for Opaque {
    fn serialize<S: Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
        Err(serde::ser::Error::custom("opaque rows cannot be stored"))
    }
}

impl Record for Opaque {
    const TABLE: &'static str = "opaque";
    const VISIBILITY_COLUMN: &'static str = "visible";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn category(&self) -> &str {
        ""
    }

    fn is_visible(&self) -> bool {
        true
    }

    fn set_visible(&mut self, _: bool) {}

    fn display_name(&self) -> &str {
        "opaque"
    }

    fn search_values(&self, _: SearchField) -> Vec<&str> {
        Vec::new()
    }

    fn created_at(&self) -> Option<&str> {
        None
    }
}

#[tokio::test]
async fn unstorable_record_rolls_back() {
    let store = Arc::new(FlakyStore::default());
    let favorites = FavoritesProvider::load(store.clone(), &config()).unwrap();
    let opaque = Opaque {
        id: RecordId::int(9),
    };

    let outcome = favorites.toggle("products", &opaque).await;

    assert_eq!(outcome, ToggleOutcome::RolledBack(false));
    assert!(!favorites.is_favorite("products", &RecordId::int(9)));
    assert!(store.get(FAVORITES_KEY).unwrap().is_none());
}

#[tokio::test]
async fn unstorable_record_leaves_other_favorites_alone() {
    let store = Arc::new(FlakyStore::default());
    let favorites = FavoritesProvider::load(store.clone(), &config()).unwrap();
    favorites.toggle("products", &pizza()).await;

    let outcome = favorites
        .toggle("products", &Opaque { id: RecordId::int(9) })
        .await;

    assert_eq!(outcome, ToggleOutcome::RolledBack(false));
    let reloaded = FavoritesProvider::load(store, &config()).unwrap();
    assert_eq!(reloaded.snapshot().items::<Product>("products"), vec![pizza()]);
}
