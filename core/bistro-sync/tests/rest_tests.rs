use bistro_model::{Product, Video};
use bistro_sync::{BackendConfig, CacheScope, RemoteTable, RestTable, SyncError};
use bistro_types::RecordId;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> BackendConfig {
    BackendConfig {
        base_url: server.uri(),
        api_key: "anon-key".into(),
        ..Default::default()
    }
}

fn product_row(id: i64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "category": "pizzas",
        "price": 9.5,
        "available": true,
        "created_at": "2024-05-01T10:00:00Z"
    })
}

// ── Config ──────────────────────────────────────────────────────

#[test]
fn backend_config_default() {
    let cfg = BackendConfig::default();
    assert_eq!(cfg.rest_path, "rest/v1");
    assert_eq!(cfg.timeout_secs, 10);
    assert!(cfg.api_key.is_empty());
}

#[test]
fn backend_config_serde_roundtrip() {
    let cfg = BackendConfig {
        base_url: "https://example.supabase.co".into(),
        api_key: "k".into(),
        ..Default::default()
    };
    let back: BackendConfig = serde_json::from_str(&serde_json::to_string(&cfg).unwrap()).unwrap();
    assert_eq!(back.base_url, "https://example.supabase.co");
    assert_eq!(back.api_key, "k");
}

// ── fetch_all ───────────────────────────────────────────────────

#[tokio::test]
async fn fetch_visible_rows_filters_on_flag_column() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .and(query_param("select", "*"))
        .and(query_param("order", "created_at.desc"))
        .and(query_param("available", "eq.true"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer anon-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([product_row(2, "Diavola"), product_row(1, "Margherita")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let table = RestTable::<Product>::new(config(&server)).unwrap();
    let rows = table.fetch_all(CacheScope::VisibleOnly).await.unwrap();

    let names: Vec<_> = rows.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Diavola", "Margherita"]);
    assert_eq!(rows[0].price, Some(9.5));
}

#[tokio::test]
async fn fetch_all_rows_skips_flag_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/videos"))
        .and(query_param_is_missing("published"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "v1", "title": "Pizza night", "url": "https://cdn.test/v1.mp4", "published": false }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let table = RestTable::<Video>::new(config(&server)).unwrap();
    let rows = table.fetch_all(CacheScope::All).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, RecordId::text("v1"));
}

#[tokio::test]
async fn fetch_http_error_is_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let table = RestTable::<Product>::new(config(&server)).unwrap();
    let err = table.fetch_all(CacheScope::VisibleOnly).await.unwrap_err();
    assert!(matches!(err, SyncError::Fetch(ref m) if m.contains("500") && m.contains("boom")));
}

#[tokio::test]
async fn fetch_malformed_body_is_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let table = RestTable::<Product>::new(config(&server)).unwrap();
    let err = table.fetch_all(CacheScope::All).await.unwrap_err();
    assert!(matches!(err, SyncError::Fetch(_)));
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let table = RestTable::<Product>::new(BackendConfig {
        timeout_secs: 1,
        ..config(&server)
    })
    .unwrap();
    let err = table.fetch_all(CacheScope::All).await.unwrap_err();
    assert!(matches!(err, SyncError::Timeout));
}

// ── Writes ──────────────────────────────────────────────────────

#[tokio::test]
async fn insert_posts_row_and_returns_representation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/products"))
        .and(header("prefer", "return=representation"))
        .and(body_partial_json(json!({ "name": "Calzone" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([product_row(3, "Calzone")])))
        .expect(1)
        .mount(&server)
        .await;

    let table = RestTable::<Product>::new(config(&server)).unwrap();
    let stored = table
        .insert(&Product::new(3, "Calzone", "pizzas"))
        .await
        .unwrap();
    assert_eq!(stored.created_at.as_deref(), Some("2024-05-01T10:00:00Z"));
}

#[tokio::test]
async fn update_patches_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/products"))
        .and(query_param("id", "eq.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([product_row(1, "Margherita DOP")])))
        .expect(1)
        .mount(&server)
        .await;

    let table = RestTable::<Product>::new(config(&server)).unwrap();
    let stored = table
        .update(&Product::new(1, "Margherita DOP", "pizzas"))
        .await
        .unwrap();
    assert_eq!(stored.name, "Margherita DOP");
}

#[tokio::test]
async fn update_of_missing_row_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let table = RestTable::<Product>::new(config(&server)).unwrap();
    let err = table
        .update(&Product::new(42, "Ghost", "pizzas"))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::NotFound(_)));
}

#[tokio::test]
async fn delete_by_text_id() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/videos"))
        .and(query_param("id", "eq.v1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let table = RestTable::<Video>::new(config(&server)).unwrap();
    table.delete(&RecordId::text("v1")).await.unwrap();
}

#[tokio::test]
async fn delete_rejected_is_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(403).set_body_string("row level security"))
        .mount(&server)
        .await;

    let table = RestTable::<Product>::new(config(&server)).unwrap();
    let err = table.delete(&RecordId::int(1)).await.unwrap_err();
    assert!(matches!(err, SyncError::Fetch(ref m) if m.contains("403")));
}
