use bistro_model::{Product, Video};
use bistro_storage::{FAVORITES_KEY, FavoriteSet, KeyValueStore, MemoryStore};
use bistro_types::RecordId;
use pretty_assertions::assert_eq;

fn pizza(id: i64) -> Product {
    Product::new(id, format!("Pizza {id}"), "pizzas")
}

// ── Defaults & loading ───────────────────────────────────────────

#[test]
fn defaults_have_standard_buckets() {
    let set = FavoriteSet::default();
    let buckets: Vec<&str> = set.buckets().collect();
    assert_eq!(buckets, vec!["articles", "images", "products", "videos"]);
    assert_eq!(set.total(), 0);
}

#[test]
fn load_without_blob_is_default() {
    let store = MemoryStore::new();
    assert_eq!(FavoriteSet::load(&store).unwrap(), FavoriteSet::default());
}

#[test]
fn load_shallow_merges_into_defaults() {
    let store = MemoryStore::new();
    store
        .set(
            FAVORITES_KEY,
            r#"{"products":[{"id":1,"name":"Pizza 1","category":"pizzas"}],"drinks":[]}"#,
        )
        .unwrap();

    let set = FavoriteSet::load(&store).unwrap();
    assert_eq!(set.count("products"), 1);
    assert_eq!(set.count("videos"), 0);
    let buckets: Vec<&str> = set.buckets().collect();
    assert_eq!(buckets, vec!["articles", "drinks", "images", "products", "videos"]);
}

#[test]
fn corrupt_blob_falls_back_to_defaults() {
    let store = MemoryStore::new();
    store.set(FAVORITES_KEY, "{not json").unwrap();
    assert_eq!(FavoriteSet::load(&store).unwrap(), FavoriteSet::default());

    store.set(FAVORITES_KEY, "[1,2]").unwrap();
    assert_eq!(FavoriteSet::load(&store).unwrap(), FavoriteSet::default());
}

#[test]
fn non_array_bucket_keeps_default() {
    let store = MemoryStore::new();
    store.set(FAVORITES_KEY, r#"{"products":"oops"}"#).unwrap();
    let set = FavoriteSet::load(&store).unwrap();
    assert_eq!(set.count("products"), 0);
}

// ── Mutation ─────────────────────────────────────────────────────

#[test]
fn add_is_idempotent() {
    let mut set = FavoriteSet::default();
    assert!(set.add("products", &pizza(1)).unwrap());
    assert!(!set.add("products", &pizza(1)).unwrap());
    assert_eq!(set.count("products"), 1);
    assert!(set.contains("products", &RecordId::int(1)));
    assert!(!set.contains("videos", &RecordId::int(1)));
}

#[test]
fn remove_reports_presence() {
    let mut set = FavoriteSet::default();
    set.add("products", &pizza(1)).unwrap();
    assert!(set.remove("products", &RecordId::int(1)));
    assert!(!set.remove("products", &RecordId::int(1)));
    assert!(!set.remove("unknown", &RecordId::int(1)));
}

#[test]
fn toggle_flips_membership() {
    let mut set = FavoriteSet::default();
    assert!(set.toggle("products", &pizza(2)).unwrap());
    assert!(!set.toggle("products", &pizza(2)).unwrap());
    assert_eq!(set.count("products"), 0);
}

#[test]
fn add_creates_unknown_bucket() {
    let mut set = FavoriteSet::default();
    set.add("specials", &pizza(3)).unwrap();
    assert_eq!(set.count("specials"), 1);
}

#[test]
fn items_decode_and_skip_foreign_rows() {
    let mut set = FavoriteSet::default();
    set.add("products", &pizza(1)).unwrap();
    set.add("products", &pizza(2)).unwrap();
    let products: Vec<Product> = set.items("products");
    assert_eq!(products, vec![pizza(1), pizza(2)]);

    // Products lack the `url` a video requires.
    let as_videos: Vec<Video> = set.items("products");
    assert!(as_videos.is_empty());
}

// ── Persistence ──────────────────────────────────────────────────

#[test]
fn save_then_load_restores_set() {
    let store = MemoryStore::new();
    let mut set = FavoriteSet::load(&store).unwrap();
    set.add("products", &pizza(1)).unwrap();
    set.save(&store).unwrap();

    let reloaded = FavoriteSet::load(&store).unwrap();
    assert_eq!(reloaded, set);
    assert_eq!(reloaded.items::<Product>("products"), vec![pizza(1)]);
}
