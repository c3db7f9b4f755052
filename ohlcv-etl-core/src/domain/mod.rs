//! Domain types for the price ETL

pub mod batch;
pub mod price;

pub use batch::RawBatch;
pub use price::{PriceRecord, StoredPrice};
