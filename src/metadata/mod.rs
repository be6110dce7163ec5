// src/metadata/mod.rs
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::secapi::client::PAGE_SIZE;
use crate::secapi::models::{Filing, QueryResponse};
use crate::secapi::QueryApi;
use crate::utils::error::QueryError;

/// Maximum tickers combined into one query, per the API's query-size limit.
pub const MAX_BATCH_LEN: usize = 100;

/// Base URL prefixed onto the relative links of legacy metadata tables.
pub const ARCHIVE_BASE_URL: &str = "https://www.sec.gov/Archives/";

const QUERY_ATTEMPTS: u32 = 3;
// Shortened under test so retry coverage runs in milliseconds
#[cfg(not(test))]
const RETRY_BASE_DELAY_MS: u64 = 500;
#[cfg(test)]
const RETRY_BASE_DELAY_MS: u64 = 10;

/// One row of the metadata table. CSV column names match the hand-off
/// artifact (`metadata.csv`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingMetadata {
    pub ticker: String,
    pub cik: String,
    #[serde(rename = "formType")]
    pub form_type: String,
    #[serde(rename = "filedAt")]
    pub filed_at: String,
    #[serde(rename = "filingUrl")]
    pub filing_url: String,
}

impl From<Filing> for FilingMetadata {
    fn from(f: Filing) -> Self {
        Self {
            ticker: f.ticker,
            cik: f.cik,
            form_type: f.formType,
            filed_at: f.filedAt,
            filing_url: f.linkToFilingDetails,
        }
    }
}

/// A metadata row in either of the two on-disk schemas. Current rows carry
/// the document URL directly; legacy rows carry a link relative to the
/// EDGAR archive root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataRecord {
    Current(FilingMetadata),
    Legacy { ticker: String, edgar_link: String },
}

impl MetadataRecord {
    pub fn ticker(&self) -> &str {
        match self {
            MetadataRecord::Current(m) => &m.ticker,
            MetadataRecord::Legacy { ticker, .. } => ticker,
        }
    }

    /// The absolute URL of the filing document.
    pub fn document_url(&self) -> String {
        match self {
            MetadataRecord::Current(m) => m.filing_url.clone(),
            MetadataRecord::Legacy { edgar_link, .. } => {
                format!("{ARCHIVE_BASE_URL}{edgar_link}")
            }
        }
    }
}

/// A (year, batch) combination whose query failed every retry attempt.
#[derive(Debug, Clone)]
pub struct SkippedBatch {
    pub year: i32,
    pub batch_index: usize,
    pub message: String,
}

/// Result of a metadata fetch run: the flattened table plus the batches
/// that were skipped after exhausting retries, so callers can see partial
/// coverage instead of inferring it from logs.
#[derive(Debug, Default)]
pub struct MetadataFetch {
    pub records: Vec<FilingMetadata>,
    pub skipped: Vec<SkippedBatch>,
}

/// Partitions `tickers` into contiguous, order-preserving batches of at
/// most `max_len`. Empty input yields zero batches.
pub fn create_batches(tickers: &[String], max_len: usize) -> Vec<&[String]> {
    tickers.chunks(max_len).collect()
}

/// Builds the query string for one (batch, year) combination: an OR-style
/// ticker filter, the inclusive calendar-year date range, and a form-type
/// filter for 10-K only (no amendments, no not-timely markers).
pub fn build_query(batch: &[String], year: i32) -> String {
    // Jan 1 and Dec 31 exist for every representable year
    let start = NaiveDate::from_ymd_opt(year, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(year, 12, 31).unwrap();

    format!(
        "ticker:({}) AND filedAt:[{} TO {}] AND formType:\"10-K\" AND NOT formType:\"10-K/A\" AND NOT formType:NT",
        batch.join(", "),
        start,
        end
    )
}

async fn get_filings_with_retry(
    query_api: &QueryApi,
    query: &str,
) -> Result<QueryResponse, QueryError> {
    let mut attempt = 0;
    loop {
        match query_api.get_filings(query).await {
            Ok(response) => return Ok(response),
            Err(e) if attempt + 1 < QUERY_ATTEMPTS => {
                attempt += 1;
                let delay = Duration::from_millis(RETRY_BASE_DELAY_MS << attempt);
                tracing::warn!(
                    "Query attempt {} failed ({}); retrying in {:?}",
                    attempt,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Fetches 10-K filing metadata for `tickers` over the inclusive year range,
/// one single-page query per (year, batch), strictly sequentially. Records
/// accumulate in [year ascending, batch order, API page order]; duplicates
/// are not removed. A batch whose query fails every retry is skipped and
/// recorded rather than aborting the run.
pub async fn fetch_10k_metadata(
    query_api: &QueryApi,
    tickers: &[String],
    start_year: i32,
    end_year: i32,
) -> MetadataFetch {
    tracing::info!(
        "Starting metadata download for {} tickers, years {}-{}",
        tickers.len(),
        start_year,
        end_year
    );

    let batches = create_batches(tickers, MAX_BATCH_LEN);
    let mut fetch = MetadataFetch::default();

    for year in start_year..=end_year {
        for (batch_index, batch) in batches.iter().enumerate() {
            let query = build_query(batch, year);

            match get_filings_with_retry(query_api, &query).await {
                Ok(response) => {
                    if response.total.value > PAGE_SIZE {
                        // Single-page query: extras beyond PAGE_SIZE are
                        // dropped by the API and not re-requested.
                        tracing::warn!(
                            "Year {} batch {}: API reports {} matching filings but only {} fetched",
                            year,
                            batch_index,
                            response.total.value,
                            response.filings.len()
                        );
                    }

                    fetch
                        .records
                        .extend(response.filings.into_iter().map(FilingMetadata::from));
                }
                Err(e) => {
                    tracing::warn!(
                        "Skipping year {} batch {} after {} failed attempts: {}",
                        year,
                        batch_index,
                        QUERY_ATTEMPTS,
                        e
                    );
                    fetch.skipped.push(SkippedBatch {
                        year,
                        batch_index,
                        message: e.to_string(),
                    });
                }
            }
        }

        tracing::info!("Downloaded metadata for year {}", year);
    }

    fetch
}
