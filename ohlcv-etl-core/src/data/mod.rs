//! Extraction and cleaning of raw OHLCV data.

pub mod canonicalize;
pub mod ingest;
pub mod local;
pub mod provider;
pub mod stooq;
pub mod synthetic;

pub use canonicalize::{Canonicalizer, TransformError};
pub use local::LocalFileExtractor;
pub use provider::{ExtractError, PriceExtractor, SourceMode};
pub use stooq::StooqExtractor;
pub use synthetic::{generate_ohlcv, write_csv, SyntheticSpec};
