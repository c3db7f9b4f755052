//! Persistence for clean price batches.
//!
//! The pipeline only sees `PriceLoader`; the upsert SQL lives with the
//! concrete store.

pub mod sqlite;

pub use sqlite::{SqliteStore, StoreTarget};

use crate::domain::PriceRecord;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unsupported connection target '{0}' (expected sqlite://<path>, sqlite::memory: or a file path)")]
    UnsupportedTarget(String),

    #[error("volume {volume} for {ticker} on {date} exceeds the store's integer range")]
    VolumeOutOfRange {
        ticker: String,
        date: chrono::NaiveDate,
        volume: u64,
    },

    #[error("persistence error: {0}")]
    Persistence(#[from] rusqlite::Error),
}

/// Idempotent sink for clean price records.
pub trait PriceLoader {
    /// Insert-or-update every record on (ticker, date), tagging rows with `source`.
    ///
    /// All-or-nothing per call. Returns the number of records submitted.
    /// An empty slice returns 0 without touching the store.
    fn upsert(&mut self, records: &[PriceRecord], source: &str) -> Result<usize, StoreError>;
}
