//! Local file extractor.
//!
//! Looks for `<dir>/<TICKER>.csv`, then `.xlsx`, then `.xls`, and returns the
//! six OHLCV columns of the first file found. Nothing is written.

use super::ingest::{read_csv_file, read_spreadsheet};
use super::provider::{ExtractError, PriceExtractor, SourceMode};
use crate::domain::RawBatch;
use std::path::PathBuf;
use tracing::debug;

/// Columns every local file must provide, in output order.
pub const REQUIRED_COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

const EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

/// Reads per-ticker price files from a directory.
pub struct LocalFileExtractor {
    data_dir: PathBuf,
}

impl LocalFileExtractor {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Candidate paths for a ticker, in lookup order.
    pub fn candidates(&self, ticker: &str) -> Vec<PathBuf> {
        let stem = ticker.trim().to_uppercase();
        EXTENSIONS
            .iter()
            .map(|ext| self.data_dir.join(format!("{stem}.{ext}")))
            .collect()
    }

    fn locate(&self, ticker: &str) -> Result<PathBuf, ExtractError> {
        let tried = self.candidates(ticker);
        match tried.iter().find(|p| p.exists()) {
            Some(path) => Ok(path.clone()),
            None => Err(ExtractError::NotFound {
                ticker: ticker.to_string(),
                tried,
            }),
        }
    }
}

/// Trim and lowercase every header.
fn normalize_headers(batch: &mut RawBatch) {
    for column in batch.columns_mut() {
        *column = column.trim().to_lowercase();
    }
}

impl PriceExtractor for LocalFileExtractor {
    fn name(&self) -> &str {
        "local_files"
    }

    fn source_tag(&self) -> &str {
        SourceMode::Local.as_str()
    }

    fn fetch(&self, ticker: &str) -> Result<RawBatch, ExtractError> {
        let path = self.locate(ticker)?;
        debug!(ticker, path = %path.display(), "reading local price file");

        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        let mut batch = if is_csv {
            read_csv_file(&path)?
        } else {
            read_spreadsheet(&path)?
        };

        normalize_headers(&mut batch);

        batch
            .select(&REQUIRED_COLUMNS)
            .map_err(|missing| ExtractError::Schema {
                path: path.clone(),
                missing,
                found: batch.columns().to_vec(),
            })
    }
}
