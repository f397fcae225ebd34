//! HTTP API tests against a real server on an ephemeral port.

use gallery::config::Config;
use gallery::models::{NewRecord, Record};
use gallery::server::{router, AppState, QUERY_PARSE_ERROR};
use gallery::store::{RecordStore, SqliteRecordStore};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

struct TestServer {
    base: String,
    store: Arc<SqliteRecordStore>,
    results_path: PathBuf,
    assets_dir: PathBuf,
    _tmp: TempDir,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn start_server() -> TestServer {
    let tmp = TempDir::new().unwrap();
    let mut config = Config::default();
    config.db.path = tmp.path().join("gallery.db");
    let results_path = tmp.path().join("results.json");
    let assets_dir = tmp.path().join("photos");
    std::fs::create_dir_all(&assets_dir).unwrap();

    let store = Arc::new(SqliteRecordStore::open(&config).await.unwrap());
    let state = AppState {
        store: store.clone(),
        results_path: results_path.clone(),
    };
    let app = router(state, assets_dir.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base: format!("http://{}", addr),
        store,
        results_path,
        assets_dir,
        _tmp: tmp,
        handle,
    }
}

async fn seed(store: &SqliteRecordStore, items: &[(&str, &str, &str)]) -> Vec<Record> {
    let mut out = Vec::new();
    for (title, description, src) in items {
        let rec = NewRecord::new(title.to_string(), description.to_string(), src.to_string());
        out.push(store.insert(&rec).await.unwrap());
    }
    out
}

#[tokio::test]
async fn test_get_all_returns_every_record_and_writes_results() {
    let srv = start_server().await;
    let seeded = seed(
        &srv.store,
        &[
            ("Dunes", "sand", "https://cdn.example/a/dunes.jpg"),
            ("Harbor", "boats", "https://cdn.example/b/harbor.png"),
            ("Forest", "trees", "https://cdn.example/c/forest.gif"),
        ],
    )
    .await;

    let resp = reqwest::get(format!("{}/", srv.base)).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Vec<Record> = resp.json().await.unwrap();
    assert_eq!(body, seeded);

    let written: Vec<Record> =
        serde_json::from_slice(&std::fs::read(&srv.results_path).unwrap()).unwrap();
    assert_eq!(written, seeded);
}

#[tokio::test]
async fn test_get_all_empty_store() {
    let srv = start_server().await;
    let resp = reqwest::get(format!("{}/", srv.base)).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_query_by_title_hit_and_miss() {
    let srv = start_server().await;
    let seeded = seed(
        &srv.store,
        &[
            ("X", "first", "https://cdn.example/a/x.jpg"),
            ("Y", "second", "https://cdn.example/a/y.jpg"),
        ],
    )
    .await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/q", srv.base))
        .json(&json!([{"title": "X"}]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Vec<Record> = resp.json().await.unwrap();
    assert_eq!(body, vec![seeded[0].clone()]);

    let resp = client
        .post(format!("{}/q", srv.base))
        .json(&json!([{"title": "nope"}]))
        .send()
        .await
        .unwrap();
    let body: Vec<Record> = resp.json().await.unwrap();
    assert_eq!(body, vec![Record::default()]);
}

#[tokio::test]
async fn test_query_results_align_with_input() {
    let srv = start_server().await;
    let seeded = seed(
        &srv.store,
        &[
            ("Dunes", "sand", "https://cdn.example/a/dunes.jpg"),
            ("Harbor", "boats", "https://cdn.example/b/harbor.png"),
        ],
    )
    .await;

    let resp = reqwest::Client::new()
        .post(format!("{}/q", srv.base))
        .json(&json!([
            {"filename": "harbor.png"},
            {"title": "Dunes", "description": "wrong"},
            {"src": "https://cdn.example/a/dunes.jpg"},
            {"title": "Dunes", "description": "sand", "filename": "dunes.jpg"}
        ]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Vec<Record> = resp.json().await.unwrap();
    assert_eq!(
        body,
        vec![
            seeded[1].clone(),
            Record::default(),
            seeded[0].clone(),
            seeded[0].clone(),
        ]
    );
}

#[tokio::test]
async fn test_query_empty_array() {
    let srv = start_server().await;
    let resp = reqwest::Client::new()
        .post(format!("{}/q", srv.base))
        .json(&json!([]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_query_malformed_json_is_400() {
    let srv = start_server().await;
    let client = reqwest::Client::new();

    for bad in ["{not json", r#"{"title": "X"}"#, r#"[1, 2]"#, ""] {
        let resp = client
            .post(format!("{}/q", srv.base))
            .header("content-type", "application/json")
            .body(bad)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "body {:?}", bad);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({ "message": QUERY_PARSE_ERROR }));
    }
}

#[tokio::test]
async fn test_images_served_from_asset_dir() {
    let srv = start_server().await;
    std::fs::write(srv.assets_dir.join("dunes.jpg"), b"jpeg-bytes").unwrap();

    let resp = reqwest::get(format!("{}/imgs/dunes.jpg", srv.base))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.bytes().await.unwrap().as_ref(), b"jpeg-bytes");

    let missing = reqwest::get(format!("{}/imgs/absent.jpg", srv.base))
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn test_health() {
    let srv = start_server().await;
    let body: Value = reqwest::get(format!("{}/health", srv.base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_results_file_served_after_listing() {
    let srv = start_server().await;

    let before = reqwest::get(format!("{}/results", srv.base)).await.unwrap();
    assert_eq!(before.status(), 404);

    let seeded = seed(&srv.store, &[("Dunes", "sand", "https://cdn.example/a/dunes.jpg")]).await;
    reqwest::get(format!("{}/", srv.base)).await.unwrap();

    let resp = reqwest::get(format!("{}/results", srv.base)).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Vec<Record> = serde_json::from_slice(&resp.bytes().await.unwrap()).unwrap();
    assert_eq!(body, seeded);
}
