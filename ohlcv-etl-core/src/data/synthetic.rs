//! Synthetic OHLCV generator for offline runs.
//!
//! Produces a seeded random walk over business days and writes it in the
//! same CSV layout Stooq serves, so `DATA_SOURCE=local` can be exercised
//! without network access.

use super::provider::ExtractError;
use crate::domain::PriceRecord;
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;

/// Parameters for one synthetic series.
#[derive(Debug, Clone)]
pub struct SyntheticSpec {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub start_price: f64,
    pub seed: u64,
    pub min_volume: u64,
    pub max_volume: u64,
}

impl SyntheticSpec {
    /// Calendar year 2025 starting at 200.0.
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap_or_default(),
            start_price: 200.0,
            seed: 42,
            min_volume: 5_000_000,
            max_volume: 50_000_000,
        }
    }
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

/// Generate one bar per weekday in `[start, end]`.
pub fn generate_ohlcv(spec: &SyntheticSpec) -> Vec<PriceRecord> {
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let ticker = spec.ticker.trim().to_uppercase();
    let (lo_vol, hi_vol) = if spec.min_volume <= spec.max_volume {
        (spec.min_volume, spec.max_volume)
    } else {
        (spec.max_volume, spec.min_volume)
    };

    let mut bars = Vec::new();
    let mut price = spec.start_price;

    for date in spec.start.iter_days().take_while(|d| *d <= spec.end) {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }

        price *= 1.0 + rng.gen_range(-0.02..=0.02);
        let open = price * (1.0 + rng.gen_range(-0.005..=0.005));
        let close = price * (1.0 + rng.gen_range(-0.005..=0.005));
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..=0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..=0.01));
        let volume = rng.gen_range(lo_vol..=hi_vol);

        bars.push(PriceRecord {
            ticker: ticker.clone(),
            date,
            open: Some(round4(open)),
            high: Some(round4(high)),
            low: Some(round4(low)),
            close: round4(close),
            volume,
        });
    }

    bars
}

/// Write records as `Date,Open,High,Low,Close,Volume` CSV, creating parent dirs.
pub fn write_csv(records: &[PriceRecord], path: &Path) -> Result<(), ExtractError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut wtr = csv::Writer::from_path(path).map_err(|e| ExtractError::Parse(e.to_string()))?;
    wtr.write_record(["Date", "Open", "High", "Low", "Close", "Volume"])
        .map_err(|e| ExtractError::Parse(e.to_string()))?;

    let fmt_opt = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
    for r in records {
        wtr.write_record([
            r.date.format("%Y-%m-%d").to_string(),
            fmt_opt(r.open),
            fmt_opt(r.high),
            fmt_opt(r.low),
            r.close.to_string(),
            r.volume.to_string(),
        ])
        .map_err(|e| ExtractError::Parse(e.to_string()))?;
    }

    wtr.flush()?;
    Ok(())
}
