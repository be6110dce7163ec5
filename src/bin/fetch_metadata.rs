// src/bin/fetch_metadata.rs
//
// Stage 2 of the pipeline: query the sec-api.io Query API for 10-K filing
// metadata over the configured year range and write metadata.csv.
use sec_fetcher::config::Config;
use sec_fetcher::secapi::QueryApi;
use sec_fetcher::storage::DataStore;
use sec_fetcher::{constituents, metadata, utils, AppError};

// Stage parameters
const START_YEAR: i32 = 2019;
const END_YEAR: i32 = 2023;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Load configuration and initialize storage
    let config = Config::load_default()?;
    let store = DataStore::new(&config.data_dir)?;

    // 3. Read tickers from the cleaned constituents table
    let tickers = constituents::load_tickers(&store)?;
    tracing::info!("Loaded {} tickers from constituents table", tickers.len());

    // 4. Fetch metadata, one single-page query per (year, batch)
    let query_api = QueryApi::new(&config.sec_api_key)?;
    let fetch = metadata::fetch_10k_metadata(&query_api, &tickers, START_YEAR, END_YEAR).await;

    for skipped in &fetch.skipped {
        tracing::warn!(
            "Coverage gap: year {} batch {} skipped ({})",
            skipped.year,
            skipped.batch_index,
            skipped.message
        );
    }

    tracing::info!(
        "Download completed. Metadata downloaded for {} filings ({} batches skipped).",
        fetch.records.len(),
        fetch.skipped.len()
    );

    // 5. Persist the hand-off artifact
    let path = store.save_metadata(&fetch.records)?;
    tracing::info!("Completed writing {}. Exiting.", path.display());

    Ok(())
}
