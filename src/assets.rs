//! Cover image downloads.
//!
//! Images are written into the configured asset directory under the last
//! path segment of their source URL, which is also the record's `filename`
//! and the name the server exposes under `/imgs/`.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::AssetsConfig;

/// Final `/`-separated segment of `src`.
///
/// `https://cdn.example/folder/image123.png` → `image123.png`. A string
/// without `/` is returned unchanged; a trailing `/` yields `""`.
pub fn filename_from_url(src: &str) -> &str {
    src.rsplit('/').next().unwrap_or(src)
}

/// Downloads source images into a local directory.
#[derive(Clone)]
pub struct AssetFetcher {
    client: reqwest::Client,
    dir: PathBuf,
}

impl AssetFetcher {
    /// Only the connection phase is bounded; a slow transfer is not cut off.
    pub fn new(config: &AssetsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            dir: config.dir.clone(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Fetches `src` and writes it to `<dir>/<filename>`, replacing any file
    /// already there. Returns the written path.
    pub async fn download(&self, src: &str) -> Result<PathBuf> {
        let filename = filename_from_url(src);
        if filename.is_empty() {
            bail!("cannot derive a filename from url: {}", src);
        }

        let response = self
            .client
            .get(src)
            .send()
            .await
            .with_context(|| format!("request failed: {}", src))?;

        let status = response.status();
        if !status.is_success() {
            bail!("image download {} returned {}", src, status);
        }

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("reading body of {}", src))?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating asset dir {}", self.dir.display()))?;

        let path = self.dir.join(filename);
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("writing {}", path.display()))?;

        tracing::debug!("saved {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}
