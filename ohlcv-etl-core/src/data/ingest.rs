//! Readers that turn CSV text and spreadsheet files into raw batches.

use super::provider::ExtractError;
use crate::domain::RawBatch;
use calamine::{open_workbook_auto, Data, DataType, Reader};
use std::io::Read;
use std::path::Path;

/// Read CSV from any reader. The first record is the header.
///
/// Ragged rows are accepted; the canonicalizer treats missing cells as
/// unparseable.
pub fn read_csv<R: Read>(reader: R) -> Result<RawBatch, ExtractError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns: Vec<String> = rdr
        .headers()
        .map_err(|e| ExtractError::Parse(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut batch = RawBatch::new(columns);
    for record in rdr.records() {
        let record = record.map_err(|e| ExtractError::Parse(e.to_string()))?;
        batch.push_row(record.iter().map(|c| c.to_string()).collect());
    }
    Ok(batch)
}

/// Read a CSV file from disk.
pub fn read_csv_file(path: &Path) -> Result<RawBatch, ExtractError> {
    let file = std::fs::File::open(path)?;
    read_csv(file)
}

/// Read the first worksheet of an .xlsx/.xls file. The first row is the header.
pub fn read_spreadsheet(path: &Path) -> Result<RawBatch, ExtractError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| ExtractError::Parse(format!("{}: {e}", path.display())))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ExtractError::Parse(format!("{}: workbook has no sheets", path.display())))?
        .map_err(|e| ExtractError::Parse(format!("{}: {e}", path.display())))?;

    let mut rows = range.rows();
    let columns = match rows.next() {
        Some(header) => header.iter().map(cell_to_string).collect(),
        None => return Ok(RawBatch::default()),
    };

    let mut batch = RawBatch::new(columns);
    for row in rows {
        batch.push_row(row.iter().map(cell_to_string).collect());
    }
    Ok(batch)
}

/// Render a spreadsheet cell the way it would have appeared in a CSV export.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_date()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| cell.to_string()),
        Data::Error(_) => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_header_and_rows() {
        let text = "Date,Open,High,Low,Close,Volume\n2025-01-02,199,211,196,201,2000000\n";
        let batch = read_csv(text.as_bytes()).unwrap();
        assert_eq!(batch.columns().len(), 6);
        assert_eq!(batch.columns()[0], "Date");
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.cell(0, 4), "201");
    }

    #[test]
    fn header_only_csv_has_no_rows() {
        let batch = read_csv("Date,Open,High,Low,Close,Volume\n".as_bytes()).unwrap();
        assert_eq!(batch.len(), 0);
        assert!(batch.is_empty());
    }

    #[test]
    fn empty_body_is_empty_batch() {
        let batch = read_csv("".as_bytes()).unwrap();
        assert!(batch.columns().is_empty());
        assert!(batch.is_empty());
    }

    #[test]
    fn ragged_rows_are_tolerated() {
        let text = "date,open,close\n2025-01-02,1\n2025-01-03,1,2,3\n";
        let batch = read_csv(text.as_bytes()).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.cell(0, 2), "");
    }

    #[test]
    fn spreadsheet_cells_render_like_csv() {
        assert_eq!(cell_to_string(&Data::Empty), "");
        assert_eq!(cell_to_string(&Data::Float(201.5)), "201.5");
        assert_eq!(cell_to_string(&Data::Int(1000)), "1000");
        assert_eq!(cell_to_string(&Data::String("AAPL".into())), "AAPL");
    }

    #[test]
    fn iso_datetime_cells_keep_only_the_date() {
        let cell = Data::DateTimeIso("2025-01-02T15:30:00".into());
        assert_eq!(cell_to_string(&cell), "2025-01-02");
    }

    #[test]
    fn unreadable_spreadsheet_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("BROKEN.xlsx");
        std::fs::write(&path, b"not a zip archive").unwrap();
        let err = read_spreadsheet(&path).unwrap_err();
        assert!(matches!(err, ExtractError::Parse(_)));
    }
}
