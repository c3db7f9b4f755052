//! OHLCV ETL CLI — pipeline runs, sample data generation, and store checks.
//!
//! Commands:
//! - `run` — extract, canonicalize, and upsert prices for the configured tickers
//! - `generate` — write a synthetic `<TICKER>.csv` for offline runs
//! - `check-db` — open the store, ensure the schema, and run `SELECT 1`

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use ohlcv_etl_core::config::{parse_tickers, ConfigError, PipelineConfig};
use ohlcv_etl_core::data::provider::SourceMode;
use ohlcv_etl_core::data::synthetic::{generate_ohlcv, write_csv, SyntheticSpec};
use ohlcv_etl_core::pipeline::{Pipeline, StdoutProgress};
use ohlcv_etl_core::store::SqliteStore;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "ohlcv-etl",
    about = "Daily OHLCV price ETL into an idempotent staging table"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run extract → transform → load for every configured ticker.
    Run {
        /// Optional TOML config file. Environment variables and flags override it.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Store target, e.g. sqlite://data/prices.db. Overrides DATABASE_URL.
        #[arg(long)]
        database_url: Option<String>,

        /// Comma-separated tickers. Overrides TICKERS.
        #[arg(long)]
        tickers: Option<String>,

        /// Data source: stooq or local. Overrides DATA_SOURCE.
        #[arg(long)]
        source: Option<SourceMode>,

        /// Directory with <TICKER>.csv/.xlsx/.xls files. Overrides LOCAL_DATA_DIR.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Print the run summary as JSON after the progress lines.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write a synthetic daily series as <out-dir>/<TICKER>.csv.
    Generate {
        /// Ticker symbol; also the file stem.
        #[arg(long)]
        ticker: String,

        /// First calendar day (YYYY-MM-DD).
        #[arg(long, default_value = "2025-01-01")]
        start: NaiveDate,

        /// Last calendar day (YYYY-MM-DD), inclusive.
        #[arg(long, default_value = "2025-12-31")]
        end: NaiveDate,

        /// Price the random walk starts from.
        #[arg(long, default_value_t = 200.0)]
        start_price: f64,

        /// RNG seed. Same seed, same series.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Output directory.
        #[arg(long, default_value = "data/raw")]
        out_dir: PathBuf,
    },
    /// Connect to the store, create the table if needed, and run SELECT 1.
    CheckDb {
        /// Store target. Overrides DATABASE_URL.
        #[arg(long)]
        database_url: Option<String>,
    },
}

fn main() -> Result<()> {
    // Unlike an overriding loader, variables already set in the shell win over
    // .env, so a one-off `DATABASE_URL=... ohlcv-etl run` is honored.
    let dotenv_path = dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Some(path) = dotenv_path {
        debug!(path = %path.display(), "loaded .env");
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            database_url,
            tickers,
            source,
            data_dir,
            json,
        } => {
            let overrides = RunOverrides {
                database_url,
                tickers,
                source,
                data_dir,
            };
            run_pipeline(config, overrides, json)
        }
        Commands::Generate {
            ticker,
            start,
            end,
            start_price,
            seed,
            out_dir,
        } => run_generate(ticker, start, end, start_price, seed, out_dir),
        Commands::CheckDb { database_url } => run_check_db(database_url),
    }
}

/// Flag values that take precedence over file and environment settings.
struct RunOverrides {
    database_url: Option<String>,
    tickers: Option<String>,
    source: Option<SourceMode>,
    data_dir: Option<PathBuf>,
}

fn build_config(config_path: Option<PathBuf>, overrides: RunOverrides) -> Result<PipelineConfig> {
    let base = match config_path {
        Some(path) => PipelineConfig::from_file(&path)?,
        None => PipelineConfig::default(),
    };
    let mut config = base.with_vars(|key| std::env::var(key).ok())?;

    if let Some(url) = overrides.database_url {
        config.database_url = url.trim().to_string();
    }
    if let Some(list) = overrides.tickers {
        config.tickers = parse_tickers(&list);
    }
    if let Some(source) = overrides.source {
        config.source = source;
    }
    if let Some(dir) = overrides.data_dir {
        config.local_data_dir = dir;
    }

    Ok(config)
}

fn run_pipeline(config_path: Option<PathBuf>, overrides: RunOverrides, json: bool) -> Result<()> {
    let config = build_config(config_path, overrides)?;
    debug!(
        source = %config.source,
        tickers = ?config.tickers,
        "starting pipeline"
    );

    let mut pipeline = Pipeline::from_config(&config)?;
    let summary = pipeline.run(&StdoutProgress)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}

fn run_generate(
    ticker: String,
    start: NaiveDate,
    end: NaiveDate,
    start_price: f64,
    seed: u64,
    out_dir: PathBuf,
) -> Result<()> {
    anyhow::ensure!(start <= end, "--start {start} is after --end {end}");
    anyhow::ensure!(
        start_price.is_finite() && start_price > 0.0,
        "--start-price must be a positive number"
    );

    let spec = SyntheticSpec {
        start,
        end,
        start_price,
        seed,
        ..SyntheticSpec::new(ticker)
    };
    let records = generate_ohlcv(&spec);

    let path = out_dir.join(format!("{}.csv", spec.ticker.trim().to_uppercase()));
    write_csv(&records, &path).with_context(|| format!("writing {}", path.display()))?;

    println!("Wrote {} rows={}", path.display(), records.len());
    Ok(())
}

fn run_check_db(database_url: Option<String>) -> Result<()> {
    let url = match database_url {
        Some(url) => url,
        None => std::env::var(ohlcv_etl_core::config::ENV_DATABASE_URL).unwrap_or_default(),
    };
    if url.trim().is_empty() {
        return Err(ConfigError::MissingDatabaseUrl.into());
    }

    let mut store = SqliteStore::new(&url)?;
    println!("Store target = {:?}", store.target());

    let value = store.ping()?;
    println!("SELECT 1 => {value}");
    Ok(())
}
