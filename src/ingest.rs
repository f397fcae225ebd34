//! Ingestion loop.
//!
//! Walks `api.pages` pages of creators. For each creator the driver fetches
//! the first listed project and its detail record, builds a [`NewRecord`]
//! from the project's title, description, and original cover URL, and hands
//! it to a worker that stores the record and downloads the cover.
//!
//! ```text
//! creators(page) ──▶ user_projects(name) ──▶ project(id) ──▶ NewRecord
//!                                                               │
//!                                       ┌───────────────────────┤ permit (≤ workers)
//!                                       ▼                       ▼
//!                                 store.insert()        fetcher.download()
//! ```
//!
//! Workers are bounded by a semaphore: when all permits are taken the
//! driver waits before fetching more. Every worker is joined before
//! [`Ingestor::run`] returns, and every failure (fetch, decode, store,
//! download) is collected into the [`IngestReport`] instead of aborting the
//! run. Nothing is deduplicated; running twice stores every record twice.

use anyhow::Result;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::assets::AssetFetcher;
use crate::client::PortfolioClient;
use crate::config::Config;
use crate::models::{NewRecord, Record};
use crate::store::RecordStore;

/// Where in the pipeline a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Creators,
    Projects,
    Project,
    Cover,
    Store,
    Download,
    Worker,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureStage::Creators => "creators",
            FailureStage::Projects => "projects",
            FailureStage::Project => "project",
            FailureStage::Cover => "cover",
            FailureStage::Store => "store",
            FailureStage::Download => "download",
            FailureStage::Worker => "worker",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct IngestFailure {
    pub stage: FailureStage,
    /// What was being processed: a page number, username, project id, or URL.
    pub subject: String,
    pub message: String,
}

impl IngestFailure {
    fn new(stage: FailureStage, subject: impl Into<String>, message: impl fmt::Display) -> Self {
        Self {
            stage,
            subject: subject.into(),
            message: message.to_string(),
        }
    }
}

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub pages_fetched: u32,
    pub creators_seen: u64,
    pub records_saved: u64,
    pub assets_downloaded: u64,
    pub failures: Vec<IngestFailure>,
}

impl IngestReport {
    pub fn failures_at(&self, stage: FailureStage) -> usize {
        self.failures.iter().filter(|f| f.stage == stage).count()
    }

    fn record_failure(&mut self, failure: IngestFailure) {
        tracing::warn!(
            stage = %failure.stage,
            subject = %failure.subject,
            "{}",
            failure.message
        );
        self.failures.push(failure);
    }

    fn absorb(&mut self, outcome: WorkerOutcome) {
        match outcome.saved {
            Ok(record) => {
                self.records_saved += 1;
                tracing::debug!("stored record {} ({})", record.id, record.title);
            }
            Err(e) => self.record_failure(IngestFailure::new(
                FailureStage::Store,
                outcome.source_url.clone(),
                format!("{:#}", e),
            )),
        }
        match outcome.downloaded {
            Ok(_) => self.assets_downloaded += 1,
            Err(e) => self.record_failure(IngestFailure::new(
                FailureStage::Download,
                outcome.source_url,
                format!("{:#}", e),
            )),
        }
    }
}

struct WorkerOutcome {
    source_url: String,
    saved: Result<Record>,
    downloaded: Result<PathBuf>,
}

/// Drives one ingestion pass against a [`RecordStore`].
pub struct Ingestor {
    client: PortfolioClient,
    fetcher: AssetFetcher,
    store: Arc<dyn RecordStore>,
    pages: u32,
    workers: usize,
}

impl Ingestor {
    pub fn new(config: &Config, store: Arc<dyn RecordStore>) -> Result<Self> {
        Ok(Self {
            client: PortfolioClient::new(&config.api)?,
            fetcher: AssetFetcher::new(&config.assets)?,
            store,
            pages: config.api.pages,
            workers: config.ingest.workers.max(1),
        })
    }

    /// Runs the loop to completion. Never fails as a whole; see
    /// [`IngestReport::failures`].
    pub async fn run(&self) -> IngestReport {
        let mut report = IngestReport::default();
        let permits = Arc::new(Semaphore::new(self.workers));
        let mut workers: JoinSet<WorkerOutcome> = JoinSet::new();
        let mut queued: u64 = 0;

        for page in 1..=self.pages {
            let creators = match self.client.creators(page).await {
                Ok(p) => {
                    report.pages_fetched += 1;
                    p.creators
                }
                Err(e) => {
                    report.record_failure(IngestFailure::new(
                        FailureStage::Creators,
                        format!("page {}", page),
                        format!("{:#}", e),
                    ));
                    continue;
                }
            };

            let expected = u64::from(self.pages) * creators.len() as u64;

            for creator in creators {
                report.creators_seen += 1;

                if creator.username.trim().is_empty() {
                    report.record_failure(IngestFailure::new(
                        FailureStage::Creators,
                        format!("creator {} on page {}", creator.id, page),
                        "creator has no username",
                    ));
                    continue;
                }

                let record = match self.build_record(&creator.username).await {
                    Ok(r) => r,
                    Err(failure) => {
                        report.record_failure(failure);
                        continue;
                    }
                };

                queued += 1;
                tracing::info!("Fetching and populating... {} / {}", queued, expected);

                // Only fails if the semaphore is closed, which never happens here.
                let Ok(permit) = permits.clone().acquire_owned().await else {
                    break;
                };
                let store = self.store.clone();
                let fetcher = self.fetcher.clone();
                workers.spawn(async move {
                    let _permit = permit;
                    persist_and_fetch(store.as_ref(), &fetcher, record).await
                });
            }
        }

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(outcome) => report.absorb(outcome),
                Err(e) => report.record_failure(IngestFailure::new(
                    FailureStage::Worker,
                    "worker task",
                    e,
                )),
            }
        }

        tracing::info!(
            "ingestion finished: {} records saved, {} assets downloaded, {} failures",
            report.records_saved,
            report.assets_downloaded,
            report.failures.len()
        );
        report
    }

    async fn build_record(&self, username: &str) -> std::result::Result<NewRecord, IngestFailure> {
        let listing = self.client.user_projects(username).await.map_err(|e| {
            IngestFailure::new(FailureStage::Projects, username, format!("{:#}", e))
        })?;

        let first = listing.projects.first().ok_or_else(|| {
            IngestFailure::new(FailureStage::Projects, username, "creator has no projects")
        })?;

        let project = self.client.project(first.id).await.map_err(|e| {
            IngestFailure::new(
                FailureStage::Project,
                format!("project {}", first.id),
                format!("{:#}", e),
            )
        })?;

        let cover = project.original_cover().ok_or_else(|| {
            IngestFailure::new(
                FailureStage::Cover,
                format!("project {}", first.id),
                "project has no original cover",
            )
        })?;

        Ok(NewRecord::new(
            project.title.clone(),
            project.description.clone(),
            cover.to_string(),
        ))
    }
}

/// Stores the record and downloads its cover concurrently. The two results
/// are independent: a failed download does not undo the insert.
async fn persist_and_fetch(
    store: &dyn RecordStore,
    fetcher: &AssetFetcher,
    record: NewRecord,
) -> WorkerOutcome {
    let (saved, downloaded) = tokio::join!(
        store.insert(&record),
        fetcher.download(&record.source_url)
    );
    WorkerOutcome {
        source_url: record.source_url,
        saved,
        downloaded,
    }
}

/// Builds an [`Ingestor`] from config and runs it once.
pub async fn run_ingest(config: &Config, store: Arc<dyn RecordStore>) -> Result<IngestReport> {
    if config.api.has_placeholder_key() {
        tracing::warn!(
            "api.api_key is still the placeholder; upstream requests will likely be rejected"
        );
    }
    let ingestor = Ingestor::new(config, store)?;
    Ok(ingestor.run().await)
}

/// Prints a run summary to stdout.
pub fn print_report(report: &IngestReport) {
    println!("ingest");
    println!("  pages fetched: {}", report.pages_fetched);
    println!("  creators seen: {}", report.creators_seen);
    println!("  records saved: {}", report.records_saved);
    println!("  assets downloaded: {}", report.assets_downloaded);
    println!("  failures: {}", report.failures.len());
    for failure in &report.failures {
        println!("    [{}] {}: {}", failure.stage, failure.subject, failure.message);
    }
}
