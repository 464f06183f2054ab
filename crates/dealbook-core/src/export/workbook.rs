//! Workbook sheets stored as CSV files

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::mapper::{named_column_count, records_from_grid};
use crate::record::{CellValue, Record};

/// A directory holding one `<sheet name>.csv` per sheet
#[derive(Debug, Clone)]
pub struct Workbook {
    dir: PathBuf,
}

impl Workbook {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Look up a sheet by name
    pub fn sheet(&self, name: &str) -> Result<Sheet> {
        let path = self.dir.join(format!("{}.csv", name));
        if !path.is_file() {
            return Err(Error::SheetNotFound(name.to_string()));
        }
        Ok(Sheet {
            name: name.to_string(),
            path,
        })
    }

    /// Names of all sheets, sorted
    pub fn sheet_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        Ok(names)
    }
}

/// One sheet of a workbook
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    path: PathBuf,
}

/// Header row and mapped records of a sheet
#[derive(Debug, Clone)]
pub struct SheetData {
    pub headers: Vec<CellValue>,
    pub records: Vec<Record>,
}

impl SheetData {
    /// Number of non-empty headers
    pub fn columns(&self) -> usize {
        named_column_count(&self.headers)
    }
}

impl Sheet {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the header row and every data row
    ///
    /// `column_limit` keeps only the first N columns. A sheet with no data
    /// rows is an [`Error::EmptyDataset`].
    pub fn read(&self, column_limit: Option<usize>) -> Result<SheetData> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)?;

        let mut rows = Vec::new();
        for result in reader.records() {
            let row = result?;
            rows.push(row.iter().map(CellValue::infer).collect::<Vec<_>>());
        }

        if rows.is_empty() {
            return Err(Error::EmptyDataset(self.name.clone()));
        }
        let mut headers = rows.remove(0);
        if rows.is_empty() {
            return Err(Error::EmptyDataset(self.name.clone()));
        }

        // Spreadsheet CSV exports often start with a byte order mark
        if let Some(CellValue::Text(first)) = headers.first_mut() {
            if let Some(stripped) = first.strip_prefix('\u{feff}') {
                *first = stripped.to_string();
            }
        }
        if let Some(limit) = column_limit {
            headers.truncate(limit);
        }

        let records = records_from_grid(&headers, &rows);
        debug!(
            "Read {} rows, {} columns from sheet \"{}\"",
            records.len(),
            named_column_count(&headers),
            self.name
        );
        Ok(SheetData { headers, records })
    }
}
