// src/storage/mod.rs
use std::fs;
use std::path::{Path, PathBuf};

use crate::metadata::{FilingMetadata, MetadataRecord};
use crate::utils::error::StorageError;

/// Layout of the pipeline's data directory and CSV persistence for the
/// metadata hand-off artifact.
///
/// ```text
/// {DATA_DIR}/russell_3000/russell-3000.csv        raw constituents
/// {DATA_DIR}/russell_3000/russell-3000-clean.csv  cleaned constituents
/// {DATA_DIR}/metadata.csv                         filing metadata table
/// {DATA_DIR}/10k_raw/{ticker}/{fileName}          downloaded documents
/// ```
pub struct DataStore {
    data_dir: PathBuf,
}

impl DataStore {
    /// Creates a new DataStore rooted at `data_dir`, creating the root
    /// directory if it doesn't exist.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self, StorageError> {
        let data_dir = data_dir.as_ref().to_path_buf();

        if !data_dir.exists() {
            fs::create_dir_all(&data_dir)?;
        }

        Ok(Self { data_dir })
    }

    pub fn constituents_dir(&self) -> PathBuf {
        self.data_dir.join("russell_3000")
    }

    pub fn raw_constituents_path(&self) -> PathBuf {
        self.constituents_dir().join("russell-3000.csv")
    }

    pub fn clean_constituents_path(&self) -> PathBuf {
        self.constituents_dir().join("russell-3000-clean.csv")
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.data_dir.join("metadata.csv")
    }

    pub fn filings_dir(&self) -> PathBuf {
        self.data_dir.join("10k_raw")
    }

    /// Writes the metadata table to `metadata.csv` with the canonical
    /// column names (ticker,cik,formType,filedAt,filingUrl).
    pub fn save_metadata(&self, records: &[FilingMetadata]) -> Result<PathBuf, StorageError> {
        let path = self.metadata_path();
        let mut writer = csv::Writer::from_path(&path)?;

        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        tracing::info!("Saved {} metadata records to {}", records.len(), path.display());

        Ok(path)
    }

    /// Loads a metadata CSV, sniffing which of the two schemas it uses from
    /// its header row: `filingUrl` marks the current schema, `EDGAR_LINK`
    /// the legacy one. Anything else is an error.
    pub fn load_metadata(&self) -> Result<Vec<MetadataRecord>, StorageError> {
        Self::load_metadata_from(&self.metadata_path())
    }

    pub fn load_metadata_from(path: &Path) -> Result<Vec<MetadataRecord>, StorageError> {
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.clone();

        if headers.iter().any(|h| h == "filingUrl") {
            let mut records = Vec::new();
            for row in reader.deserialize::<FilingMetadata>() {
                records.push(MetadataRecord::Current(row?));
            }
            return Ok(records);
        }

        let ticker_col = headers.iter().position(|h| h == "TICKER");
        let link_col = headers.iter().position(|h| h == "EDGAR_LINK");

        match (ticker_col, link_col) {
            (Some(ticker_col), Some(link_col)) => {
                let mut records = Vec::new();
                for row in reader.records() {
                    let row = row?;
                    records.push(MetadataRecord::Legacy {
                        ticker: row.get(ticker_col).unwrap_or_default().to_string(),
                        edgar_link: row.get(link_col).unwrap_or_default().to_string(),
                    });
                }
                Ok(records)
            }
            _ => Err(StorageError::UnknownSchema(
                headers.iter().collect::<Vec<_>>().join(","),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metadata() -> Vec<FilingMetadata> {
        vec![
            FilingMetadata {
                ticker: "AVGO".to_string(),
                cik: "1730168".to_string(),
                form_type: "10-K".to_string(),
                filed_at: "2021-12-17T16:42:51-05:00".to_string(),
                filing_url: "https://www.sec.gov/Archives/edgar/data/1730168/a.htm".to_string(),
            },
            FilingMetadata {
                ticker: "AMAT".to_string(),
                cik: "6951".to_string(),
                form_type: "10-K".to_string(),
                filed_at: "2021-12-17T16:14:51-05:00".to_string(),
                filing_url: "https://www.sec.gov/Archives/edgar/data/6951/b.htm".to_string(),
            },
        ]
    }

    #[test]
    fn save_then_load_roundtrips_current_schema() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path()).unwrap();

        let records = sample_metadata();
        let path = store.save_metadata(&records).unwrap();

        let header = std::fs::read_to_string(&path).unwrap();
        assert!(header.starts_with("ticker,cik,formType,filedAt,filingUrl"));

        let loaded = store.load_metadata().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0], MetadataRecord::Current(records[0].clone()));
        assert_eq!(loaded[1].ticker(), "AMAT");
    }

    #[test]
    fn loads_legacy_schema_by_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata_2017.csv");
        std::fs::write(
            &path,
            "TICKER,COMPANY,EDGAR_LINK\nDE,Deere,edgar/data/315189/0001.htm\n",
        )
        .unwrap();

        let records = DataStore::load_metadata_from(&path).unwrap();
        assert_eq!(
            records,
            vec![MetadataRecord::Legacy {
                ticker: "DE".to_string(),
                edgar_link: "edgar/data/315189/0001.htm".to_string(),
            }]
        );
    }

    #[test]
    fn unknown_header_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("odd.csv");
        std::fs::write(&path, "symbol,link\nDE,x.htm\n").unwrap();

        let err = DataStore::load_metadata_from(&path).unwrap_err();
        assert!(matches!(err, StorageError::UnknownSchema(_)));
    }
}
