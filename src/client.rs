//! Portfolio API client.
//!
//! Three endpoint shapes are used, all authenticated with a `client_id`
//! query parameter and paginated with `page`:
//!
//! | Call | Path |
//! |------|------|
//! | [`PortfolioClient::creators`] | `/creativestofollow?page={n}` |
//! | [`PortfolioClient::user_projects`] | `/users/{username}/projects?page=1` |
//! | [`PortfolioClient::project`] | `/projects/{id}?page=1` |
//!
//! Path parameters are percent-encoded as single segments, so a username
//! cannot escape into another path or the query string. Non-success
//! statuses and undecodable bodies are returned as errors.

use anyhow::{anyhow, bail, Context, Result};
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::ApiConfig;
use crate::models::{ApiCreatorsPage, ApiProject, ApiProjectEnvelope, ApiUserProjects};

#[derive(Clone)]
pub struct PortfolioClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl PortfolioClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("invalid api.base_url {:?}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            bail!("invalid api.base_url {:?}", config.base_url);
        }
        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    /// One page of creators to follow. Pages start at 1.
    pub async fn creators(&self, page: u32) -> Result<ApiCreatorsPage> {
        self.get_json(&["creativestofollow"], page).await
    }

    /// Projects listed for `username`, first page only.
    pub async fn user_projects(&self, username: &str) -> Result<ApiUserProjects> {
        self.get_json(&["users", username, "projects"], 1).await
    }

    pub async fn project(&self, id: i64) -> Result<ApiProject> {
        let id = id.to_string();
        let envelope: ApiProjectEnvelope = self.get_json(&["projects", &id], 1).await?;
        Ok(envelope.project)
    }

    /// `base_url` with `segments` appended, each encoded as one segment.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("{} cannot take a path", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str], page: u32) -> Result<T> {
        let url = self.url(segments)?;
        tracing::debug!("GET {} page={}", url, page);

        let response = self
            .http
            .get(url.clone())
            .query(&[
                ("page", page.to_string()),
                ("client_id", self.api_key.clone()),
            ])
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("{} returned {}: {}", url, status, truncate(&body, 200));
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("decoding response from {}", url))
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
