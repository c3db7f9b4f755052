//! SQLite-backed `stg_prices` store.
//!
//! The connection is opened on first use and the table is created if it does
//! not exist yet. Every upsert call runs in one transaction.

use super::{PriceLoader, StoreError};
use crate::domain::{PriceRecord, StoredPrice};
use rusqlite::{params, Connection};
use std::path::PathBuf;
use tracing::debug;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS stg_prices (
    ticker      TEXT      NOT NULL,
    date        DATE      NOT NULL,
    open        REAL,
    high        REAL,
    low         REAL,
    close       REAL      NOT NULL CHECK (close > 0),
    volume      INTEGER   NOT NULL DEFAULT 0 CHECK (volume >= 0),
    source      TEXT      NOT NULL,
    ingested_at TIMESTAMP NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
    UNIQUE (ticker, date)
);
"#;

const UPSERT_SQL: &str = r#"
INSERT INTO stg_prices (ticker, date, open, high, low, close, volume, source, ingested_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, strftime('%Y-%m-%d %H:%M:%f', 'now'))
ON CONFLICT (ticker, date) DO UPDATE SET
    open        = excluded.open,
    high        = excluded.high,
    low         = excluded.low,
    close       = excluded.close,
    volume      = excluded.volume,
    source      = excluded.source,
    ingested_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
"#;

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTarget {
    Memory,
    File(PathBuf),
}

impl StoreTarget {
    /// Parse a connection target.
    ///
    /// Accepts `sqlite::memory:`, `:memory:`, `sqlite://<path>`,
    /// `sqlite:<path>` and bare paths. Other URL schemes are rejected.
    pub fn parse(target: &str) -> Result<Self, StoreError> {
        let t = target.trim();
        if t.is_empty() {
            return Err(StoreError::UnsupportedTarget(target.to_string()));
        }

        let rest = t
            .strip_prefix("sqlite://")
            .or_else(|| t.strip_prefix("sqlite:"))
            .unwrap_or(t);

        if rest == ":memory:" {
            return Ok(StoreTarget::Memory);
        }
        if rest.is_empty() || rest.contains("://") {
            return Err(StoreError::UnsupportedTarget(target.to_string()));
        }
        Ok(StoreTarget::File(PathBuf::from(rest)))
    }

    fn open(&self) -> Result<Connection, StoreError> {
        let conn = match self {
            StoreTarget::Memory => Connection::open_in_memory()?,
            StoreTarget::File(path) => Connection::open(path)?,
        };
        Ok(conn)
    }
}

/// SQLite implementation of `PriceLoader`.
pub struct SqliteStore {
    target: StoreTarget,
    conn: Option<Connection>,
}

impl SqliteStore {
    /// Create a store for `target`. Does not connect yet.
    pub fn new(target: &str) -> Result<Self, StoreError> {
        Ok(Self {
            target: StoreTarget::parse(target)?,
            conn: None,
        })
    }

    pub fn target(&self) -> &StoreTarget {
        &self.target
    }

    /// Whether a connection has been opened.
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    fn connection(&mut self) -> Result<&mut Connection, StoreError> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => {
                debug!(store = ?self.target, "opening price store");
                let conn = self.target.open()?;
                conn.execute_batch(SCHEMA_SQL)?;
                conn
            }
        };
        Ok(self.conn.insert(conn))
    }

    /// Round-trip `SELECT 1`, creating the schema on the way if needed.
    pub fn ping(&mut self) -> Result<i64, StoreError> {
        let conn = self.connection()?;
        let one = conn.query_row("SELECT 1", [], |row| row.get(0))?;
        Ok(one)
    }

    /// Total rows in `stg_prices`.
    pub fn row_count(&mut self) -> Result<usize, StoreError> {
        let conn = self.connection()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM stg_prices", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// All stored rows for a ticker, ordered by date.
    pub fn prices_for(&mut self, ticker: &str) -> Result<Vec<StoredPrice>, StoreError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT ticker, date, open, high, low, close, volume, source, ingested_at
             FROM stg_prices WHERE ticker = ?1 ORDER BY date",
        )?;
        let rows = stmt.query_map([ticker], |row| {
            let volume: i64 = row.get(6)?;
            Ok(StoredPrice {
                record: PriceRecord {
                    ticker: row.get(0)?,
                    date: row.get(1)?,
                    open: row.get(2)?,
                    high: row.get(3)?,
                    low: row.get(4)?,
                    close: row.get(5)?,
                    volume: volume.max(0) as u64,
                },
                source: row.get(7)?,
                ingested_at: row.get(8)?,
            })
        })?;
        let prices = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(prices)
    }
}

impl PriceLoader for SqliteStore {
    fn upsert(&mut self, records: &[PriceRecord], source: &str) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }

        let conn = self.connection()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(UPSERT_SQL)?;
            for r in records {
                let volume =
                    i64::try_from(r.volume).map_err(|_| StoreError::VolumeOutOfRange {
                        ticker: r.ticker.clone(),
                        date: r.date,
                        volume: r.volume,
                    })?;
                stmt.execute(params![
                    r.ticker, r.date, r.open, r.high, r.low, r.close, volume, source
                ])?;
            }
        }
        tx.commit()?;

        debug!(rows = records.len(), source, "upserted batch");
        Ok(records.len())
    }
}
