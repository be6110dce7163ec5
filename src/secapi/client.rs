// src/secapi/client.rs
use reqwest::header;

use crate::secapi::models::QueryResponse;
use crate::utils::error::QueryError;

const QUERY_API_BASE_URL: &str = "https://api.sec-api.io";

/// Results per query page. The fetch stage issues a single page per
/// (year, batch); anything beyond this count is dropped by the API.
pub const PAGE_SIZE: u64 = 200;

/// Client for the sec-api.io full-text Query API.
pub struct QueryApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl QueryApi {
    pub fn new(api_key: &str) -> Result<Self, QueryError> {
        Self::with_base_url(api_key, QUERY_API_BASE_URL)
    }

    /// Constructor with a base-URL override, for tests against a mock server.
    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self, QueryError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Submits one query-string search and returns the first page of
    /// results: up to [`PAGE_SIZE`] filings sorted by filing date descending.
    pub async fn get_filings(&self, query: &str) -> Result<QueryResponse, QueryError> {
        let body = serde_json::json!({
            "query": {
                "query_string": {
                    "query": query,
                    "time_zone": "America/New_York",
                }
            },
            "from": "0",
            "size": PAGE_SIZE.to_string(),
            "sort": [{"filedAt": {"order": "desc"}}],
        });

        tracing::debug!("Submitting query: {}", query);

        let response = self
            .client
            .post(&self.base_url)
            .header(header::AUTHORIZATION, &self.api_key)
            .json(&body)
            .send()
            .await?; // Propagates reqwest::Error as QueryError::Network

        let status = response.status();
        if !status.is_success() {
            tracing::error!("HTTP error status: {} from Query API", status);
            return Err(QueryError::Http(status));
        }

        let parsed = response
            .json::<QueryResponse>()
            .await
            .map_err(|e| QueryError::Parse(e.to_string()))?;

        tracing::debug!(
            "Query returned {} filings ({} total hits)",
            parsed.filings.len(),
            parsed.total.value
        );

        Ok(parsed)
    }
}

/// Client for the sec-api.io Render API, which fetches a rendered filing
/// document given its EDGAR URL.
pub struct RenderApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RenderApi {
    pub fn new(api_key: &str) -> Result<Self, QueryError> {
        Self::with_base_url(api_key, QUERY_API_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self, QueryError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Fetches the document at `url` through the paid render endpoint and
    /// returns its body as text.
    pub async fn get_filing(&self, url: &str) -> Result<String, QueryError> {
        let endpoint = format!("{}/filing-reader", self.base_url);

        let response = self
            .client
            .get(&endpoint)
            .query(&[("token", self.api_key.as_str()), ("url", url)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("HTTP error status: {} from Render API for URL: {}", status, url);
            return Err(QueryError::Http(status));
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_filings_sends_single_page_query_and_decodes_response() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("POST", "/")
            .match_header("authorization", "test-key")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "query": {
                    "query_string": {
                        "query": "ticker:(AVGO) AND formType:\"10-K\"",
                        "time_zone": "America/New_York",
                    }
                },
                "from": "0",
                "size": "200",
            })))
            .with_status(200)
            .with_body(
                r#"{
                    "total": {"value": 1, "relation": "eq"},
                    "filings": [{
                        "ticker": "AVGO",
                        "cik": "1730168",
                        "formType": "10-K",
                        "filedAt": "2021-12-17T16:42:51-05:00",
                        "linkToFilingDetails": "https://www.sec.gov/Archives/edgar/data/1730168/a.htm"
                    }]
                }"#,
            )
            .create_async()
            .await;

        let api = QueryApi::with_base_url("test-key", &server.url()).unwrap();
        let response = api
            .get_filings("ticker:(AVGO) AND formType:\"10-K\"")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.total.value, 1);
        assert_eq!(response.filings.len(), 1);
        assert_eq!(response.filings[0].ticker, "AVGO");
        assert_eq!(
            response.filings[0].linkToFilingDetails,
            "https://www.sec.gov/Archives/edgar/data/1730168/a.htm"
        );
    }

    #[tokio::test]
    async fn get_filings_maps_http_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(403)
            .create_async()
            .await;

        let api = QueryApi::with_base_url("bad-key", &server.url()).unwrap();
        let err = api.get_filings("ticker:(AVGO)").await.unwrap_err();

        match err {
            QueryError::Http(status) => assert_eq!(status.as_u16(), 403),
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn render_api_passes_token_and_url() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/filing-reader")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("token".into(), "test-key".into()),
                mockito::Matcher::UrlEncoded(
                    "url".into(),
                    "https://www.sec.gov/Archives/edgar/data/123/x.htm".into(),
                ),
            ]))
            .with_status(200)
            .with_body("<html>filing</html>")
            .create_async()
            .await;

        let api = RenderApi::with_base_url("test-key", &server.url()).unwrap();
        let body = api
            .get_filing("https://www.sec.gov/Archives/edgar/data/123/x.htm")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(body, "<html>filing</html>");
    }
}
