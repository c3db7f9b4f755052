//! RawBatch — untrusted tabular rows as produced by an extractor.

use super::price::PriceRecord;

/// Column-named rows of string cells, before any validation.
///
/// Rows may be shorter than the header (ragged CSV); missing cells read as
/// the empty string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBatch {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawBatch {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    /// Build a batch from string literals. Handy for tests and fixtures.
    pub fn from_strs(columns: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    /// Render clean records back into the raw form a store export would have:
    /// lowercase headers, empty cells for missing prices.
    pub fn from_records(records: &[PriceRecord]) -> Self {
        let columns = ["date", "open", "high", "low", "close", "volume"]
            .iter()
            .map(|c| c.to_string())
            .collect();
        let fmt_opt = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
        let rows = records
            .iter()
            .map(|r| {
                vec![
                    r.date.format("%Y-%m-%d").to_string(),
                    fmt_opt(r.open),
                    fmt_opt(r.high),
                    fmt_opt(r.low),
                    r.close.to_string(),
                    r.volume.to_string(),
                ]
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut [String] {
        &mut self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when there is nothing to transform: no rows, or no columns at all.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    /// Index of the first column with exactly this name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at (row, column), or "" when the row is too short.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    /// Keep only the named columns, in the given order.
    ///
    /// Returns the names that could not be found instead when any is missing.
    pub fn select(&self, names: &[&str]) -> Result<RawBatch, Vec<String>> {
        let mut indices = Vec::with_capacity(names.len());
        let mut missing = Vec::new();
        for name in names {
            match self.column_index(name) {
                Some(i) => indices.push(i),
                None => missing.push(name.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(missing);
        }

        let rows = (0..self.rows.len())
            .map(|r| indices.iter().map(|&c| self.cell(r, c).to_string()).collect())
            .collect();
        Ok(RawBatch {
            columns: names.iter().map(|n| n.to_string()).collect(),
            rows,
        })
    }
}
