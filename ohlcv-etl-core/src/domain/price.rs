//! PriceRecord — one cleaned daily bar, ready for the store.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Cleaned OHLCV record for a single ticker on a single day.
///
/// Produced by the canonicalizer. `close` is always strictly positive;
/// open/high/low are kept as `None` when the source value did not parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: u64,
}

impl PriceRecord {
    /// Largest volume the store can hold (SQLite INTEGER is signed 64-bit).
    pub const MAX_VOLUME: u64 = i64::MAX as u64;

    /// Natural key of the record.
    pub fn key(&self) -> (&str, NaiveDate) {
        (self.ticker.as_str(), self.date)
    }
}

/// A row as persisted in `stg_prices`, including store-assigned fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPrice {
    pub record: PriceRecord,
    pub source: String,
    pub ingested_at: NaiveDateTime,
}
