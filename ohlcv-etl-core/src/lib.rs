//! OHLCV ETL core: extractors, canonicalization, and an idempotent price store.
//!
//! - Extractors pull a raw batch per ticker (local CSV/Excel or Stooq HTTP)
//! - The canonicalizer turns a raw batch into clean `PriceRecord`s
//! - Loaders upsert clean records keyed on (ticker, date)
//! - `Pipeline` drives the three stages sequentially over a ticker list

pub mod config;
pub mod data;
pub mod domain;
pub mod pipeline;
pub mod store;

pub use config::{ConfigError, PipelineConfig};
pub use pipeline::{Pipeline, PipelineError, PipelineProgress, RunSummary, StdoutProgress};
