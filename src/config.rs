//! TOML configuration.
//!
//! Every section has defaults, so an empty file (or no file at all, see
//! [`load_config_or_default`]) yields a runnable configuration. The only
//! value a user normally has to supply is `api.api_key`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Placeholder shipped in the default config. Requests made with it are
/// rejected upstream, so startup warns when it is still in place.
pub const PLACEHOLDER_API_KEY: &str = "YOUR API KEY";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// Pool size. Ingestion workers share it with the HTTP server.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// How long a writer waits on a locked database before failing.
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
            busy_timeout_secs: default_busy_timeout_secs(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./gallery.db")
}
fn default_max_connections() -> u32 {
    5
}
fn default_busy_timeout_secs() -> u64 {
    5
}

/// Upstream portfolio API settings.
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_key")]
    pub api_key: String,
    /// Number of creator-list pages walked by the ingestion loop.
    #[serde(default = "default_pages")]
    pub pages: u32,
    #[serde(default = "default_api_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: default_api_key(),
            pages: default_pages(),
            timeout_secs: default_api_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.behance.net/v2".to_string()
}
fn default_api_key() -> String {
    PLACEHOLDER_API_KEY.to_string()
}
fn default_pages() -> u32 {
    10
}
fn default_api_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct AssetsConfig {
    #[serde(default = "default_assets_dir")]
    pub dir: PathBuf,
    /// Dial timeout for image downloads. The transfer itself is unbounded.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            dir: default_assets_dir(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("./photos")
}
fn default_connect_timeout_secs() -> u64 {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    /// Upper bound on concurrently running save+download tasks.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

fn default_workers() -> usize {
    8
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// File rewritten with the full record dump on every `GET /`.
    #[serde(default = "default_results_path")]
    pub results_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            results_path: default_results_path(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}
fn default_results_path() -> PathBuf {
    PathBuf::from("./results.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrowserConfig {
    #[serde(default = "default_open")]
    pub open: bool,
    #[serde(default = "default_browser_urls")]
    pub urls: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            open: default_open(),
            urls: default_browser_urls(),
        }
    }
}

fn default_open() -> bool {
    true
}
/// The record listing, then the results file it writes.
fn default_browser_urls() -> Vec<String> {
    vec![
        "http://localhost:8080".to_string(),
        "http://localhost:8080/results".to_string(),
    ]
}

impl ApiConfig {
    pub fn has_placeholder_key(&self) -> bool {
        self.api_key.trim().is_empty() || self.api_key == PLACEHOLDER_API_KEY
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Loads `path` if it exists, otherwise returns the defaults.
///
/// A file that exists but fails to parse or validate is still an error.
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::warn!(
            "config file {} not found, using built-in defaults",
            path.display()
        );
        Ok(Config::default())
    }
}

pub fn validate(config: &Config) -> Result<()> {
    if config.api.base_url.trim().is_empty() {
        anyhow::bail!("api.base_url must not be empty");
    }
    if config.db.max_connections == 0 {
        anyhow::bail!("db.max_connections must be >= 1");
    }
    if config.api.pages == 0 {
        anyhow::bail!("api.pages must be >= 1");
    }
    if config.ingest.workers == 0 {
        anyhow::bail!("ingest.workers must be >= 1");
    }
    if config.assets.connect_timeout_secs == 0 {
        anyhow::bail!("assets.connect_timeout_secs must be >= 1");
    }
    Ok(())
}
