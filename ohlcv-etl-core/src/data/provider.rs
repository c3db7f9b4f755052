//! Extractor trait and structured error types.
//!
//! The PriceExtractor trait abstracts over where raw price rows come from
//! (Stooq over HTTP, local CSV/spreadsheet files) so the pipeline can be
//! pointed at either one, or at a fake in tests.

use crate::domain::RawBatch;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Structured error types for extraction.
///
/// These are designed to be displayable in CLI output as-is.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("local price file not found for ticker={ticker}. Tried: {}", display_paths(.tried))]
    NotFound { ticker: String, tried: Vec<PathBuf> },

    #[error("{} is missing required columns: {missing:?}. Found columns: {found:?}", .path.display())]
    Schema {
        path: PathBuf,
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to parse price data: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Which extractor a run uses. Also recorded per row as the source tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    #[default]
    Stooq,
    Local,
}

impl SourceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceMode::Stooq => "stooq",
            SourceMode::Local => "local",
        }
    }
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stooq" => Ok(SourceMode::Stooq),
            "local" => Ok(SourceMode::Local),
            other => Err(format!("unknown data source '{other}' (expected stooq or local)")),
        }
    }
}

/// Trait for price extractors (Stooq, local files, test fakes).
///
/// Implementations return the source's rows untouched apart from whatever
/// header handling the format itself needs. Cleaning is the canonicalizer's job.
pub trait PriceExtractor {
    /// Human-readable name of this extractor.
    fn name(&self) -> &str;

    /// Tag stored with every row this extractor produced.
    fn source_tag(&self) -> &str;

    /// Fetch the full daily history available for a ticker.
    fn fetch(&self, ticker: &str) -> Result<RawBatch, ExtractError>;
}
