//! Canonicalizer: raw extractor rows → clean, deduplicated price records.
//!
//! Order of operations is fixed:
//! rename → attach ticker → coerce → drop invalid → sort → dedupe (keep last).
//! Open/high/low that fail to parse become `None`; a bad date or close drops
//! the row; a bad volume becomes 0.

use crate::domain::{PriceRecord, RawBatch};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;
use tracing::debug;

/// Source header → canonical column name.
const RENAMES: [(&str, &str); 6] = [
    ("Date", "date"),
    ("Open", "open"),
    ("High", "high"),
    ("Low", "low"),
    ("Close", "close"),
    ("Volume", "volume"),
];

/// Date-only layouts tried after RFC 3339.
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d", "%d.%m.%Y"];

/// Date-time layouts whose time part is discarded.
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    #[error("raw batch is missing columns {missing:?} (found {found:?})")]
    MissingColumns {
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("ticker must not be empty")]
    EmptyTicker,
}

/// Canonicalizer for raw price batches
pub struct Canonicalizer;

impl Canonicalizer {
    /// Turn a raw batch into clean records for `ticker`.
    pub fn transform(ticker: &str, raw: &RawBatch) -> Result<Vec<PriceRecord>, TransformError> {
        if raw.is_empty() {
            return Ok(Vec::new());
        }

        let mut raw = raw.clone();
        Self::rename_columns(&mut raw);
        let idx = ColumnIndex::resolve(&raw)?;

        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(TransformError::EmptyTicker);
        }

        let mut records = Vec::with_capacity(raw.len());
        for row in 0..raw.len() {
            let Some(date) = parse_date(raw.cell(row, idx.date)) else {
                continue;
            };
            let Some(close) = parse_price(raw.cell(row, idx.close)) else {
                continue;
            };
            if close <= 0.0 {
                continue;
            }
            records.push(PriceRecord {
                ticker: ticker.clone(),
                date,
                open: parse_price(raw.cell(row, idx.open)),
                high: parse_price(raw.cell(row, idx.high)),
                low: parse_price(raw.cell(row, idx.low)),
                close,
                volume: parse_volume(raw.cell(row, idx.volume)),
            });
        }

        let dropped = raw.len() - records.len();
        if dropped > 0 {
            debug!(ticker = %ticker, dropped, "dropped rows without a valid date or close");
        }

        Ok(Self::dedupe_keep_last(records))
    }

    /// Rename capitalised source headers to their canonical lowercase names.
    pub fn rename_columns(raw: &mut RawBatch) {
        for column in raw.columns_mut() {
            if let Some((_, to)) = RENAMES.iter().find(|(from, _)| *from == column.as_str()) {
                *column = to.to_string();
            }
        }
    }

    /// Stable-sort by (ticker, date) and keep the last record of each key.
    ///
    /// Stability means records sharing a key stay in source order, so "last"
    /// is the later source row.
    pub fn dedupe_keep_last(mut records: Vec<PriceRecord>) -> Vec<PriceRecord> {
        records.sort_by(|a, b| a.key().cmp(&b.key()));

        let mut out: Vec<PriceRecord> = Vec::with_capacity(records.len());
        for rec in records {
            match out.last_mut() {
                Some(prev) if prev.key() == rec.key() => *prev = rec,
                _ => out.push(rec),
            }
        }
        out
    }
}

/// Positions of the canonical columns in a renamed batch.
struct ColumnIndex {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl ColumnIndex {
    fn resolve(raw: &RawBatch) -> Result<Self, TransformError> {
        let mut missing = Vec::new();
        let mut find = |name: &str| {
            raw.column_index(name).unwrap_or_else(|| {
                missing.push(name.to_string());
                usize::MAX
            })
        };
        let idx = Self {
            date: find("date"),
            open: find("open"),
            high: find("high"),
            low: find("low"),
            close: find("close"),
            volume: find("volume"),
        };
        if missing.is_empty() {
            Ok(idx)
        } else {
            Err(TransformError::MissingColumns {
                missing,
                found: raw.columns().to_vec(),
            })
        }
    }
}

/// Parse a calendar date from the formats sources commonly emit.
pub fn parse_date(cell: &str) -> Option<NaiveDate> {
    let s = cell.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.date())
        })
}

/// Parse a finite float; anything else is `None`.
pub fn parse_price(cell: &str) -> Option<f64> {
    cell.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Parse volume as float then truncate. Unparseable or negative → 0.
///
/// Values above `PriceRecord::MAX_VOLUME` are clamped to it.
pub fn parse_volume(cell: &str) -> u64 {
    match parse_price(cell) {
        Some(v) if v >= 0.0 => (v.trunc() as u64).min(PriceRecord::MAX_VOLUME),
        _ => 0,
    }
}
