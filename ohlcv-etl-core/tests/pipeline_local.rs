//! End-to-end runs: local files → canonicalizer → SQLite file store.

use chrono::NaiveDate;
use ohlcv_etl_core::config::PipelineConfig;
use ohlcv_etl_core::data::provider::{ExtractError, SourceMode};
use ohlcv_etl_core::data::synthetic::{generate_ohlcv, write_csv, SyntheticSpec};
use ohlcv_etl_core::pipeline::{NoProgress, Pipeline, PipelineError};
use ohlcv_etl_core::store::SqliteStore;
use std::path::Path;
use std::thread;
use std::time::Duration;

const AAPL_CSV: &str = "\
Date,Open,High,Low,Close,Volume,Adj Close
2025-01-02,190,200,185,195,1000000,194.1
2025-01-03,191,205,189,199,1500000,198.0
2025-01-03,199,211,196,201,2000000,200.2
2025-01-06,x,207,195,-5,1200000,0
not a date,1,1,1,1,1,1
";

fn config_for(data_dir: &Path, db: &Path, tickers: &[&str]) -> PipelineConfig {
    PipelineConfig {
        database_url: format!("sqlite://{}", db.display()),
        tickers: tickers.iter().map(|t| t.to_string()).collect(),
        source: SourceMode::Local,
        local_data_dir: data_dir.to_path_buf(),
        ..PipelineConfig::default()
    }
}

#[test]
fn local_run_loads_clean_rows_and_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("raw");
    std::fs::create_dir_all(&data_dir).unwrap();
    std::fs::write(data_dir.join("AAPL.csv"), AAPL_CSV).unwrap();

    let msft = generate_ohlcv(&SyntheticSpec {
        end: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
        ..SyntheticSpec::new("MSFT")
    });
    write_csv(&msft, &data_dir.join("MSFT.csv")).unwrap();

    let db = dir.path().join("prices.db");
    let config = config_for(&data_dir, &db, &["AAPL", "MSFT"]);

    let summary = Pipeline::from_config(&config).unwrap().run(&NoProgress).unwrap();
    assert_eq!(summary.source, "local");
    assert_eq!(summary.tickers[0].raw_rows, 5);
    assert_eq!(summary.tickers[0].clean_rows, 2);
    assert_eq!(summary.tickers[1].clean_rows, msft.len());
    assert_eq!(summary.total_loaded, 2 + msft.len());

    let mut store = SqliteStore::new(&config.database_url).unwrap();
    let first = store.prices_for("AAPL").unwrap();
    assert_eq!(first.len(), 2);
    let dup = &first[1].record;
    assert_eq!(dup.date, NaiveDate::from_ymd_opt(2025, 1, 3).unwrap());
    assert_eq!(dup.open, Some(199.0));
    assert_eq!(dup.high, Some(211.0));
    assert_eq!(dup.low, Some(196.0));
    assert_eq!(dup.close, 201.0);
    assert_eq!(dup.volume, 2_000_000);
    assert!(first.iter().all(|p| p.source == "local"));
    drop(store);

    thread::sleep(Duration::from_millis(20));
    Pipeline::from_config(&config).unwrap().run(&NoProgress).unwrap();

    let mut store = SqliteStore::new(&config.database_url).unwrap();
    assert_eq!(store.row_count().unwrap(), 2 + msft.len());
    let second = store.prices_for("AAPL").unwrap();
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.record, b.record);
        assert!(b.ingested_at > a.ingested_at);
    }
}

#[test]
fn missing_file_aborts_after_committing_earlier_tickers() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("AAPL.csv"), AAPL_CSV).unwrap();
    let db = dir.path().join("prices.db");
    let config = config_for(dir.path(), &db, &["AAPL", "NOPE", "MSFT"]);

    let err = Pipeline::from_config(&config).unwrap().run(&NoProgress).unwrap_err();
    match err {
        PipelineError::Extract {
            ticker,
            source: ExtractError::NotFound { tried, .. },
        } => {
            assert_eq!(ticker, "NOPE");
            assert_eq!(tried.len(), 3);
        }
        other => panic!("unexpected error: {other}"),
    }

    let mut store = SqliteStore::new(&config.database_url).unwrap();
    assert_eq!(store.row_count().unwrap(), 2);
    assert!(store.prices_for("MSFT").unwrap().is_empty());
}

#[test]
fn header_only_file_loads_nothing_and_never_creates_store() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ZZZZ.csv"), "Date,Open,High,Low,Close,Volume\n").unwrap();
    let db = dir.path().join("prices.db");
    let config = config_for(dir.path(), &db, &["ZZZZ"]);

    let summary = Pipeline::from_config(&config).unwrap().run(&NoProgress).unwrap();

    assert_eq!(summary.total_loaded, 0);
    assert!(!db.exists());
}

#[test]
fn file_without_required_columns_is_schema_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("AAPL.csv"), "Date,Close\n2025-01-02,100\n").unwrap();
    let db = dir.path().join("prices.db");
    let config = config_for(dir.path(), &db, &["AAPL"]);

    let err = Pipeline::from_config(&config).unwrap().run(&NoProgress).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Extract {
            source: ExtractError::Schema { .. },
            ..
        }
    ));
}
