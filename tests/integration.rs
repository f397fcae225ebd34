use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn gallery_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_gallery"))
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    // Port 9 (discard) refuses connections, so every upstream call fails fast.
    let config_content = format!(
        r#"[db]
path = "{root}/data/gallery.db"

[api]
base_url = "http://127.0.0.1:9"
api_key = "test"
pages = 3
timeout_secs = 2

[assets]
dir = "{root}/photos"

[server]
bind = "127.0.0.1:0"
results_path = "{root}/results.json"

[browser]
open = false
"#,
        root = root.display()
    );

    let config_path = config_dir.join("gallery.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_gallery(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = gallery_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("GALLERY_API_KEY")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run gallery binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_gallery(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/gallery.db").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_gallery(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_gallery(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_ingest_with_unreachable_api_completes() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_gallery(&config_path, &["ingest"]);
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("pages fetched: 0"), "{}", stdout);
    assert!(stdout.contains("records saved: 0"), "{}", stdout);
    assert!(stdout.contains("failures: 3"), "{}", stdout);
}

#[test]
fn test_ingest_pages_override() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_gallery(&config_path, &["ingest", "--pages", "1"]);
    assert!(success);
    assert!(stdout.contains("failures: 1"), "{}", stdout);
}

#[test]
fn test_query_on_empty_store_prints_zero_record() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) =
        run_gallery(&config_path, &["query", "--title", "anything"]);
    assert!(success, "query failed: {}", stderr);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["id"], 0);
    assert_eq!(value["title"], "");
}

#[test]
fn test_export_empty_store() {
    let (tmp, config_path) = setup_test_env();

    let out = tmp.path().join("dump.json");
    let (_, stderr, success) =
        run_gallery(&config_path, &["export", "--output", out.to_str().unwrap()]);
    assert!(success, "export failed: {}", stderr);
    assert_eq!(fs::read_to_string(&out).unwrap(), "[]");
}

#[test]
fn test_invalid_config_is_rejected() {
    let (_tmp, config_path) = setup_test_env();
    fs::write(&config_path, "[ingest]\nworkers = 0\n").unwrap();

    let (_, stderr, success) = run_gallery(&config_path, &["init"]);
    assert!(!success);
    assert!(stderr.contains("ingest.workers"), "{}", stderr);
}
