//! Local extraction from a real `.xlsx` workbook.
//!
//! `fixtures/AAPL.xlsx` has a `Prices` sheet with mixed-case headers, an
//! `Adj Close` column, Excel date cells (plus one text date) and a row with a
//! negative close.

use chrono::NaiveDate;
use ohlcv_etl_core::config::PipelineConfig;
use ohlcv_etl_core::data::canonicalize::Canonicalizer;
use ohlcv_etl_core::data::local::LocalFileExtractor;
use ohlcv_etl_core::data::provider::{PriceExtractor, SourceMode};
use ohlcv_etl_core::domain::PriceRecord;
use ohlcv_etl_core::pipeline::{NoProgress, Pipeline};
use ohlcv_etl_core::store::SqliteStore;
use std::path::PathBuf;

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
}

fn expected() -> Vec<PriceRecord> {
    vec![
        PriceRecord {
            ticker: "AAPL".into(),
            date: day(2),
            open: Some(199.5),
            high: Some(211.0),
            low: Some(196.0),
            close: 201.25,
            volume: 2_000_000,
        },
        PriceRecord {
            ticker: "AAPL".into(),
            date: day(3),
            open: Some(202.0),
            high: Some(205.0),
            low: Some(200.0),
            close: 204.0,
            volume: 1_500_000,
        },
        PriceRecord {
            ticker: "AAPL".into(),
            date: day(6),
            open: Some(204.0),
            high: Some(206.0),
            low: Some(203.0),
            close: 205.0,
            volume: 900_000,
        },
    ]
}

#[test]
fn workbook_headers_are_normalized_and_dates_rendered_iso() {
    let raw = LocalFileExtractor::new(fixtures()).fetch("aapl").unwrap();

    assert_eq!(
        raw.columns(),
        ["date", "open", "high", "low", "close", "volume"]
    );
    assert_eq!(raw.len(), 4);
    assert_eq!(raw.cell(0, 0), "2025-01-02");
    assert_eq!(raw.cell(1, 0), "2025-01-03");
    assert_eq!(raw.cell(2, 0), "2025-01-06");
}

#[test]
fn workbook_transforms_to_clean_records() {
    let raw = LocalFileExtractor::new(fixtures()).fetch("AAPL").unwrap();
    let clean = Canonicalizer::transform("AAPL", &raw).unwrap();

    assert_eq!(clean, expected());
}

#[test]
fn workbook_loads_through_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        database_url: format!("sqlite://{}", dir.path().join("prices.db").display()),
        tickers: vec!["AAPL".into()],
        source: SourceMode::Local,
        local_data_dir: fixtures(),
        ..PipelineConfig::default()
    };

    let summary = Pipeline::from_config(&config).unwrap().run(&NoProgress).unwrap();
    assert_eq!(summary.tickers[0].raw_rows, 4);
    assert_eq!(summary.total_loaded, 3);

    let mut store = SqliteStore::new(&config.database_url).unwrap();
    let stored: Vec<PriceRecord> = store
        .prices_for("AAPL")
        .unwrap()
        .into_iter()
        .map(|p| p.record)
        .collect();
    assert_eq!(stored, expected());
}
