// src/bin/fetch_constituents.rs
//
// Stage 1 of the pipeline: download the Russell 3000 constituents list and
// clean it into the canonical table the later stages read tickers from.
use sec_fetcher::config::Config;
use sec_fetcher::storage::DataStore;
use sec_fetcher::{constituents, utils, AppError};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Load configuration and initialize storage
    let config = Config::load_default()?;
    let store = DataStore::new(&config.data_dir)?;

    // 3. Download, store raw, clean
    let rows = constituents::fetch_constituents(&config, &store).await?;

    tracing::info!("Constituents fetch completed: {} cleaned rows", rows);

    Ok(())
}
