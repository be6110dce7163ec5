// src/bin/fetch_filings.rs
//
// Stage 3 of the pipeline: download the filing documents listed in
// metadata.csv to {DATA_DIR}/10k_raw/{ticker}/, in parallel, skipping
// files that already exist.
use sec_fetcher::config::Config;
use sec_fetcher::download::{self, FetchEngine};
use sec_fetcher::storage::DataStore;
use sec_fetcher::{utils, AppError};

// Stage parameters
const WORKERS: usize = download::DEFAULT_WORKERS;
const ENGINE: FetchEngine = FetchEngine::Http;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Load configuration and initialize storage
    let config = Config::load_default()?;
    let store = DataStore::new(&config.data_dir)?;

    // 3. Read the metadata table (schema sniffed from its header row)
    let records = store.load_metadata()?;
    tracing::info!("Loaded {} metadata records", records.len());

    // 4. Download all filings on the worker pool
    let fetcher = ENGINE.build(&config.sec_api_key)?;
    let summary =
        download::download_filings(fetcher.as_ref(), &records, &store.filings_dir(), WORKERS).await;

    for url in &summary.failed_urls {
        tracing::warn!("Failed to download: {}", url);
    }

    if summary.downloaded == 0 && summary.failed > 0 {
        return Err(AppError::Processing(format!(
            "Failed to download any filings ({} failures)",
            summary.failed
        )));
    }

    Ok(())
}
