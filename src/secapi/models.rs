// src/secapi/models.rs
#![allow(non_snake_case)]
use serde::Deserialize;

/// Response envelope of the sec-api.io full-text Query API.
/// Field names mirror the wire format.
#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    pub total: TotalHits,
    pub filings: Vec<Filing>,
}

/// Hit count reported by the API. `relation` is "eq" when `value` is exact
/// and "gte" when the true total exceeds what the API will count.
#[derive(Debug, Deserialize)]
pub struct TotalHits {
    pub value: u64,
    pub relation: String,
}

/// One filing object from a query response. The API returns more fields
/// than these; only the ones the pipeline consumes are modeled.
#[derive(Debug, Clone, Deserialize)]
pub struct Filing {
    pub ticker: String,
    pub cik: String,
    pub formType: String,
    pub filedAt: String,
    pub linkToFilingDetails: String,
}
