// src/constituents/mod.rs
use std::fs;

use csv::StringRecord;

use crate::config::Config;
use crate::storage::DataStore;
use crate::utils::error::ConstituentsError;

/// A row is "empty" when it has no fields or carries a non-breaking space,
/// which is how the iShares export marks its header/footer framing rows.
fn is_empty_row(row: &StringRecord) -> bool {
    row.is_empty() || row.iter().any(|field| field.contains('\u{a0}'))
}

/// Slices out the content region of the raw constituents file: the rows
/// strictly between the first and second empty rows. The framing structure
/// is fixed upstream; a file without two empty rows is malformed.
pub fn content_region(rows: &[StringRecord]) -> Result<&[StringRecord], ConstituentsError> {
    let mut empty_indices = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| is_empty_row(row))
        .map(|(i, _)| i);

    match (empty_indices.next(), empty_indices.next()) {
        (Some(first), Some(second)) => Ok(&rows[first + 1..second]),
        _ => Err(ConstituentsError::MalformedFile(
            "expected at least two empty framing rows".to_string(),
        )),
    }
}

fn parse_rows(raw: &[u8]) -> Result<Vec<StringRecord>, ConstituentsError> {
    // The framing rows have varying field counts, so the reader must accept
    // ragged records.
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(raw);

    let mut rows = Vec::new();
    for row in reader.records() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Downloads the raw constituents CSV from the configured URL, stores it
/// verbatim, then writes the cleaned content region alongside it. Returns
/// the number of cleaned rows (including the holdings header row).
pub async fn fetch_constituents(
    config: &Config,
    store: &DataStore,
) -> Result<usize, ConstituentsError> {
    tracing::info!("Downloading constituents list from {}", config.russell_3000_url);

    let response = reqwest::get(&config.russell_3000_url).await?;
    let status = response.status();
    if !status.is_success() {
        tracing::error!("HTTP error status: {} fetching constituents list", status);
        return Err(ConstituentsError::Http(status));
    }
    let raw = response.bytes().await?;

    fs::create_dir_all(store.constituents_dir())?;
    fs::write(store.raw_constituents_path(), &raw)?;
    tracing::info!(
        "Saved raw constituents ({} bytes) to {}",
        raw.len(),
        store.raw_constituents_path().display()
    );

    let rows = parse_rows(&raw)?;
    let cleaned = content_region(&rows)?;

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(store.clean_constituents_path())?;
    for row in cleaned {
        writer.write_record(row)?;
    }
    writer.flush()?;

    tracing::info!(
        "Saved {} cleaned rows to {}",
        cleaned.len(),
        store.clean_constituents_path().display()
    );

    Ok(cleaned.len())
}

/// Reads the `Ticker` column from the cleaned constituents CSV, in file
/// order. The cleaned file's first row is the holdings header.
pub fn load_tickers(store: &DataStore) -> Result<Vec<String>, ConstituentsError> {
    let mut reader = csv::Reader::from_path(store.clean_constituents_path())?;

    let ticker_col = reader
        .headers()?
        .iter()
        .position(|h| h == "Ticker")
        .ok_or_else(|| {
            ConstituentsError::MalformedFile("no Ticker column in cleaned constituents".to_string())
        })?;

    let mut tickers = Vec::new();
    for row in reader.records() {
        let row = row?;
        if let Some(ticker) = row.get(ticker_col) {
            tickers.push(ticker.to_string());
        }
    }

    Ok(tickers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    fn framed_rows() -> Vec<StringRecord> {
        // Empty markers at indices 3 and 10; content is rows 4..=9.
        let mut rows = vec![
            record(&["iShares Russell 3000 ETF"]),
            record(&["Fund Holdings as of", "2023-06-30"]),
            record(&["Inception Date", "2000-05-22"]),
            record(&["\u{a0}"]),
        ];
        rows.push(record(&["Ticker", "Name", "Sector"]));
        for i in 0..5 {
            rows.push(StringRecord::from(vec![
                format!("T{i}"),
                format!("Company {i}"),
                "Tech".to_string(),
            ]));
        }
        rows.push(record(&["\u{a0}"]));
        rows.push(record(&["Source: BlackRock"]));
        rows
    }

    #[test]
    fn content_region_is_between_framing_rows() {
        let rows = framed_rows();
        let cleaned = content_region(&rows).unwrap();

        assert_eq!(cleaned.len(), 6);
        assert_eq!(cleaned[0], record(&["Ticker", "Name", "Sector"]));
        assert_eq!(cleaned[5], record(&["T4", "Company 4", "Tech"]));
        // Identical to rows 4..=9 of the input, order preserved
        assert_eq!(cleaned, &rows[4..10]);
    }

    #[test]
    fn zero_field_rows_count_as_empty() {
        let rows = vec![
            record(&["header"]),
            StringRecord::new(),
            record(&["Ticker"]),
            record(&["AVGO"]),
            StringRecord::new(),
        ];

        let cleaned = content_region(&rows).unwrap();
        assert_eq!(cleaned, &rows[2..4]);
    }

    #[test]
    fn fewer_than_two_framing_rows_is_malformed() {
        let rows = vec![record(&["Ticker"]), record(&["AVGO"]), record(&["\u{a0}"])];

        let err = content_region(&rows).unwrap_err();
        assert!(matches!(err, ConstituentsError::MalformedFile(_)));
    }

    #[test]
    fn load_tickers_reads_ticker_column() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path()).unwrap();
        fs::create_dir_all(store.constituents_dir()).unwrap();
        fs::write(
            store.clean_constituents_path(),
            "Ticker,Name,Sector\nAVGO,Broadcom,Tech\nAMAT,Applied Materials,Tech\n",
        )
        .unwrap();

        let tickers = load_tickers(&store).unwrap();
        assert_eq!(tickers, vec!["AVGO".to_string(), "AMAT".to_string()]);
    }

    #[test]
    fn load_tickers_requires_ticker_column() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path()).unwrap();
        fs::create_dir_all(store.constituents_dir()).unwrap();
        fs::write(store.clean_constituents_path(), "Symbol,Name\nAVGO,Broadcom\n").unwrap();

        let err = load_tickers(&store).unwrap_err();
        assert!(matches!(err, ConstituentsError::MalformedFile(_)));
    }
}
