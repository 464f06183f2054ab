//! Header-to-record mapping
//!
//! Zips a header row with each data row of a sheet. Columns with a blank
//! header are dropped; rows are truncated or padded to the header length so
//! every record carries exactly one field per named column.

use crate::record::{CellValue, Record};

/// Header text for a header cell, `None` when the column is unnamed
fn header_name(cell: &CellValue) -> Option<String> {
    match cell {
        CellValue::Text(s) if s.trim().is_empty() => None,
        CellValue::Text(s) => Some(s.clone()),
        CellValue::Empty | CellValue::Bool(false) => None,
        CellValue::Number(n) if *n == 0.0 => None,
        other => Some(other.to_string()),
    }
}

/// Number of named columns in a header row
pub fn named_column_count(headers: &[CellValue]) -> usize {
    headers.iter().filter_map(header_name).count()
}

/// Build one record per data row, in row order
pub fn records_from_grid(headers: &[CellValue], rows: &[Vec<CellValue>]) -> Vec<Record> {
    let columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter_map(|(i, cell)| header_name(cell).map(|name| (i, name)))
        .collect();

    rows.iter()
        .map(|row| {
            columns
                .iter()
                .map(|(i, name)| (name.clone(), row.get(*i).cloned().unwrap_or_default()))
                .collect()
        })
        .collect()
}
