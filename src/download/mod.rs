// src/download/mod.rs
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::header;

use crate::metadata::MetadataRecord;
use crate::secapi::RenderApi;
use crate::utils::error::{FetchError, QueryError};

// IMPORTANT: Replace with your actual details or make configurable
const EDGAR_USER_AGENT: &str = "sec_fetcher research pipeline admin@example.com";
// SEC asks for 10 requests/second max. Be conservative. >100ms delay.
const EDGAR_REQUEST_DELAY_MS: u64 = 150;

/// Default size of the download worker pool.
pub const DEFAULT_WORKERS: usize = 8;

/// Static choice of document fetch engine, made once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchEngine {
    /// Plain HTTP GET against the public EDGAR archive.
    Http,
    /// The paid sec-api.io Render API.
    RenderApi,
}

impl FetchEngine {
    pub fn build(self, api_key: &str) -> Result<Box<dyn DocumentFetcher>, QueryError> {
        match self {
            FetchEngine::Http => Ok(Box::new(HttpFetcher::new()?)),
            FetchEngine::RenderApi => Ok(Box::new(RenderApiFetcher::new(api_key)?)),
        }
    }
}

/// Capability to fetch a filing document body given its URL. The two
/// production implementations are interchangeable.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Fetches documents with a plain GET against the public archive.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, QueryError> {
        let client = reqwest::Client::builder()
            .user_agent(EDGAR_USER_AGENT) // Set the required User-Agent
            .build()
            .map_err(QueryError::Network)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        // Basic rate limiting; with the default pool size this keeps the
        // request rate under the SEC's stated limit.
        tokio::time::sleep(Duration::from_millis(EDGAR_REQUEST_DELAY_MS)).await;

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/xml,text/html,text/plain,*/*")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(status));
        }

        Ok(response.text().await?)
    }
}

/// Fetches documents through the sec-api.io Render API.
pub struct RenderApiFetcher {
    api: RenderApi,
}

impl RenderApiFetcher {
    pub fn new(api_key: &str) -> Result<Self, QueryError> {
        Ok(Self {
            api: RenderApi::new(api_key)?,
        })
    }

    pub fn from_api(api: RenderApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl DocumentFetcher for RenderApiFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        Ok(self.api.get_filing(url).await?)
    }
}

/// Rewrites an inline-XBRL viewer URL to point at the underlying raw
/// document instead of the interactive viewer wrapper.
pub fn strip_inline_viewer(url: &str) -> String {
    url.replace("ix?doc=/", "")
}

/// Final path segment of a URL, used as the local file name.
pub fn file_name_from_url(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

/// Why a single download failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Fetch,
    Write,
}

/// Outcome of one download task.
#[derive(Debug)]
pub enum DownloadStatus {
    Downloaded,
    Skipped,
    Failed {
        kind: FailureKind,
        url: String,
        message: String,
    },
}

/// Aggregated outcome of a download run.
#[derive(Debug, Default)]
pub struct DownloadSummary {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failed_urls: Vec<String>,
}

impl DownloadSummary {
    fn record(&mut self, status: DownloadStatus) {
        match status {
            DownloadStatus::Downloaded => self.downloaded += 1,
            DownloadStatus::Skipped => self.skipped += 1,
            DownloadStatus::Failed { url, .. } => {
                self.failed += 1;
                self.failed_urls.push(url);
            }
        }
    }
}

async fn write_document(dest: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // Write to a sibling temp file then rename, so a failed attempt never
    // leaves a partial document at the destination path.
    let mut part = dest.as_os_str().to_owned();
    part.push(".part");
    let part = PathBuf::from(part);
    tokio::fs::write(&part, content).await?;
    tokio::fs::rename(&part, dest).await
}

/// Downloads one filing. Every failure is contained in the returned status;
/// this function never propagates an error to the pool.
async fn download_one(
    fetcher: &dyn DocumentFetcher,
    record: &MetadataRecord,
    filings_dir: &Path,
) -> DownloadStatus {
    let ticker = record.ticker();
    let url = record.document_url();

    let file_name = file_name_from_url(&url);
    let dest: PathBuf = filings_dir.join(ticker).join(file_name);

    if dest.exists() {
        tracing::info!("Already exists, skipping download: {}", url);
        return DownloadStatus::Skipped;
    }

    // Do not download the iXBRL viewer output
    let fetch_url = strip_inline_viewer(&url);

    let content = match fetcher.fetch(&fetch_url).await {
        Ok(content) => content,
        Err(e) => {
            tracing::error!("Download failed: {} ({})", fetch_url, e);
            return DownloadStatus::Failed {
                kind: FailureKind::Fetch,
                url: fetch_url,
                message: e.to_string(),
            };
        }
    };

    if let Err(e) = write_document(&dest, &content).await {
        tracing::error!("Failed to write {}: {}", dest.display(), e);
        return DownloadStatus::Failed {
            kind: FailureKind::Write,
            url: fetch_url,
            message: e.to_string(),
        };
    }

    tracing::debug!("Saved {} bytes to {}", content.len(), dest.display());
    DownloadStatus::Downloaded
}

/// Downloads every record in the table onto a bounded worker pool. Tasks
/// run with no ordering guarantee; per-item failures are recorded in the
/// summary and never abort the run. Re-running over the same table is
/// idempotent: existing destination files are skipped without a fetch.
pub async fn download_filings(
    fetcher: &dyn DocumentFetcher,
    records: &[MetadataRecord],
    filings_dir: &Path,
    workers: usize,
) -> DownloadSummary {
    tracing::info!(
        "Downloading {} filings to {} with {} workers",
        records.len(),
        filings_dir.display(),
        workers
    );

    let mut summary = DownloadSummary::default();

    let mut statuses = stream::iter(records)
        .map(|record| download_one(fetcher, record, filings_dir))
        .buffer_unordered(workers.max(1));

    while let Some(status) = statuses.next().await {
        summary.record(status);
    }

    tracing::info!(
        "Download completed. Downloaded: {}, skipped: {}, failed: {}",
        summary.downloaded,
        summary.skipped,
        summary.failed
    );

    summary
}
