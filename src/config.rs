// src/config.rs
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::utils::error::ConfigError;

/// Run configuration, loaded once per binary from `config.json` and passed
/// explicitly to each component. Keys match the on-disk JSON document.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Root storage path for all pipeline artifacts.
    #[serde(rename = "DATA_DIR")]
    pub data_dir: PathBuf,

    /// Credential for the sec-api.io Query and Render APIs.
    #[serde(rename = "SEC_API_KEY")]
    pub sec_api_key: String,

    /// Source URL for the Russell 3000 constituents list.
    #[serde(rename = "RUSSELL_3000_URL")]
    pub russell_3000_url: String,
}

impl Config {
    /// Loads configuration from the given JSON file. A missing file or a
    /// missing key is fatal to the run.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `config.json` from the working directory, matching how the
    /// pipeline binaries are invoked.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load("config.json")
    }
}
