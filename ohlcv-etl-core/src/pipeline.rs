//! Pipeline driver — runs extract → transform → load for each ticker in turn.
//!
//! There is no per-ticker isolation. The first failure aborts the run; tickers
//! already loaded stay committed because each load is its own transaction.

use crate::config::{ConfigError, PipelineConfig};
use crate::data::canonicalize::{Canonicalizer, TransformError};
use crate::data::local::LocalFileExtractor;
use crate::data::provider::{ExtractError, PriceExtractor, SourceMode};
use crate::data::stooq::StooqExtractor;
use crate::store::{PriceLoader, SqliteStore, StoreError};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to set up extractor: {0}")]
    ExtractorSetup(#[source] ExtractError),

    #[error("failed to set up store: {0}")]
    StoreSetup(#[source] StoreError),

    #[error("extract failed for {ticker}: {source}")]
    Extract { ticker: String, source: ExtractError },

    #[error("transform failed for {ticker}: {source}")]
    Transform { ticker: String, source: TransformError },

    #[error("load failed for {ticker}: {source}")]
    Load { ticker: String, source: StoreError },
}

/// One step of a run, as reported to progress observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Extracting { ticker: String },
    Transforming { ticker: String, rows: usize },
    Loading { ticker: String, clean_rows: usize },
    Done { total_loaded: usize },
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::Extracting { ticker } => write!(f, "[ETL] Extracting {ticker} ..."),
            ProgressEvent::Transforming { ticker, rows } => {
                write!(f, "[ETL] Transforming {ticker} ... rows={rows}")
            }
            ProgressEvent::Loading { ticker, clean_rows } => {
                write!(f, "[ETL] Loading {ticker} ... clean_rows={clean_rows}")
            }
            ProgressEvent::Done { total_loaded } => {
                write!(f, "[ETL] Done. Loaded/Upserted rows: {total_loaded}")
            }
        }
    }
}

/// Progress callback for a pipeline run.
pub trait PipelineProgress {
    fn on_event(&self, event: &ProgressEvent);
}

/// Prints each event as one line on stdout.
pub struct StdoutProgress;

impl PipelineProgress for StdoutProgress {
    fn on_event(&self, event: &ProgressEvent) {
        println!("{event}");
    }
}

/// Discards progress.
pub struct NoProgress;

impl PipelineProgress for NoProgress {
    fn on_event(&self, _event: &ProgressEvent) {}
}

/// Row counts for one ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickerSummary {
    pub ticker: String,
    pub raw_rows: usize,
    pub clean_rows: usize,
    pub loaded: usize,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub source: String,
    pub tickers: Vec<TickerSummary>,
    pub total_loaded: usize,
}

/// Sequential ETL over a fixed ticker list.
pub struct Pipeline {
    tickers: Vec<String>,
    extractor: Box<dyn PriceExtractor>,
    loader: Box<dyn PriceLoader>,
}

impl Pipeline {
    pub fn new(
        tickers: Vec<String>,
        extractor: Box<dyn PriceExtractor>,
        loader: Box<dyn PriceLoader>,
    ) -> Self {
        Self {
            tickers,
            extractor,
            loader,
        }
    }

    /// Validate the config, then build the configured extractor and the store.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;

        let extractor: Box<dyn PriceExtractor> = match config.source {
            SourceMode::Stooq => Box::new(
                StooqExtractor::with_endpoint(config.endpoint_template.clone())
                    .map_err(PipelineError::ExtractorSetup)?,
            ),
            SourceMode::Local => Box::new(LocalFileExtractor::new(&config.local_data_dir)),
        };
        let loader = SqliteStore::new(&config.database_url).map_err(PipelineError::StoreSetup)?;

        Ok(Self::new(config.tickers.clone(), extractor, Box::new(loader)))
    }

    pub fn extractor_name(&self) -> &str {
        self.extractor.name()
    }

    /// Process every ticker, stopping at the first error.
    pub fn run(&mut self, progress: &dyn PipelineProgress) -> Result<RunSummary, PipelineError> {
        let source = self.extractor.source_tag().to_string();
        let mut summary = RunSummary {
            source: source.clone(),
            ..RunSummary::default()
        };

        for ticker in &self.tickers {
            progress.on_event(&ProgressEvent::Extracting {
                ticker: ticker.clone(),
            });
            let raw = self
                .extractor
                .fetch(ticker)
                .map_err(|source| PipelineError::Extract {
                    ticker: ticker.clone(),
                    source,
                })?;

            progress.on_event(&ProgressEvent::Transforming {
                ticker: ticker.clone(),
                rows: raw.len(),
            });
            let clean =
                Canonicalizer::transform(ticker, &raw).map_err(|source| PipelineError::Transform {
                    ticker: ticker.clone(),
                    source,
                })?;

            progress.on_event(&ProgressEvent::Loading {
                ticker: ticker.clone(),
                clean_rows: clean.len(),
            });
            let loaded = self
                .loader
                .upsert(&clean, &source)
                .map_err(|source| PipelineError::Load {
                    ticker: ticker.clone(),
                    source,
                })?;

            info!(
                ticker = %ticker,
                raw_rows = raw.len(),
                clean_rows = clean.len(),
                loaded,
                "ticker loaded"
            );
            summary.total_loaded += loaded;
            summary.tickers.push(TickerSummary {
                ticker: ticker.clone(),
                raw_rows: raw.len(),
                clean_rows: clean.len(),
                loaded,
            });
        }

        progress.on_event(&ProgressEvent::Done {
            total_loaded: summary.total_loaded,
        });
        Ok(summary)
    }
}
