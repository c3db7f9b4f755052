//! Stooq data extractor.
//!
//! Fetches the full daily history for a US ticker as CSV from Stooq's
//! download endpoint. One attempt per call: non-success statuses and network
//! failures surface as `ExtractError::Transport`.
//!
//! An unknown ticker comes back as a body with no data rows (sometimes just a
//! `No data` line). That parses to an empty batch, not an error.

use super::ingest::read_csv;
use super::provider::{ExtractError, PriceExtractor, SourceMode};
use crate::domain::RawBatch;
use std::time::Duration;
use tracing::debug;

/// Default endpoint; `{symbol}` is replaced by the lowercased ticker.
pub const DEFAULT_ENDPOINT_TEMPLATE: &str = "https://stooq.com/q/d/l/?s={symbol}.us&i=d";

/// Request timeout for a single fetch.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Stooq CSV extractor.
pub struct StooqExtractor {
    client: reqwest::blocking::Client,
    endpoint_template: String,
}

impl StooqExtractor {
    pub fn new() -> Result<Self, ExtractError> {
        Self::with_endpoint(DEFAULT_ENDPOINT_TEMPLATE)
    }

    /// Build an extractor against a custom endpoint template.
    pub fn with_endpoint(template: impl Into<String>) -> Result<Self, ExtractError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ExtractError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint_template: template.into(),
        })
    }

    /// Build the download URL for a ticker.
    pub fn url_for(&self, ticker: &str) -> String {
        self.endpoint_template
            .replace("{symbol}", &ticker.trim().to_lowercase())
    }
}

impl PriceExtractor for StooqExtractor {
    fn name(&self) -> &str {
        "stooq"
    }

    fn source_tag(&self) -> &str {
        SourceMode::Stooq.as_str()
    }

    fn fetch(&self, ticker: &str) -> Result<RawBatch, ExtractError> {
        let url = self.url_for(ticker);
        debug!(ticker, %url, "fetching daily prices");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| ExtractError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ExtractError::Transport(format!("HTTP {status} for {ticker}")));
        }

        let body = resp
            .text()
            .map_err(|e| ExtractError::Transport(format!("failed to read body for {ticker}: {e}")))?;

        read_csv(body.as_bytes())
    }
}
