//! Sheet storage: a workbook is a directory of CSV files, one per sheet.
//!
//! This is the only module that touches sheet files. Readers distinguish
//! required sheets (missing file is an error for the caller to surface)
//! from optional ones (missing file is just an empty table).

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{PricewatchError, Result};
use crate::observability::metrics;
use crate::table::RawTable;

#[derive(Debug, Clone)]
pub struct Workbook {
    dir: PathBuf,
}

impl Workbook {
    /// Open a workbook directory, creating it when absent.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Workbook { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn sheet_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", name))
    }

    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheet_path(name).exists()
    }

    /// Read a sheet that must exist.
    pub fn read_sheet(&self, name: &str) -> Result<RawTable> {
        let path = self.sheet_path(name);
        if !path.exists() {
            metrics::sheets::read_error(name);
            return Err(PricewatchError::Sheet {
                message: format!("sheet '{}' not found at {}", name, path.display()),
            });
        }
        match RawTable::from_csv_path(&path) {
            Ok(table) => {
                metrics::sheets::read_success(name);
                Ok(table)
            }
            Err(e) => {
                metrics::sheets::read_error(name);
                Err(e)
            }
        }
    }

    /// Read an optional sheet. A missing or unreadable sheet degrades to an
    /// empty table with a logged warning, never an error.
    pub fn read_sheet_or_empty(&self, name: &str) -> RawTable {
        let path = self.sheet_path(name);
        if !path.exists() {
            return RawTable::default();
        }
        match RawTable::from_csv_path(&path) {
            Ok(table) => {
                metrics::sheets::read_success(name);
                table
            }
            Err(e) => {
                metrics::sheets::read_error(name);
                warn!(sheet = name, "unreadable optional sheet treated as empty: {}", e);
                RawTable::default()
            }
        }
    }

    /// Replace a sheet's contents wholesale.
    pub fn replace_sheet(&self, name: &str, table: &RawTable) -> Result<()> {
        let path = self.sheet_path(name);
        match table.to_csv_path(&path) {
            Ok(()) => {
                metrics::sheets::write_success(name);
                Ok(())
            }
            Err(e) => {
                metrics::sheets::write_error(name);
                Err(e)
            }
        }
    }

    /// Append rows to a sheet. When the sheet is absent or empty the incoming
    /// table is written as-is, header included; otherwise incoming rows are
    /// reordered onto the existing header and appended, and the header is not
    /// rewritten.
    pub fn append_rows(&self, name: &str, table: &RawTable) -> Result<()> {
        if table.is_empty() && table.headers().is_empty() {
            return Ok(());
        }

        let existing = if self.has_sheet(name) {
            self.read_sheet(name)?
        } else {
            RawTable::default()
        };

        if existing.headers().is_empty() {
            return self.replace_sheet(name, table);
        }

        let header_refs: Vec<&str> = existing.headers().iter().map(|h| h.as_str()).collect();
        let aligned = table.select_columns(&header_refs);
        let mut merged = existing;
        if aligned.headers().len() == merged.headers().len() {
            for row in aligned.rows() {
                merged.push_row(row.clone());
            }
        } else {
            // Header drift between runs: fall back to positional append so
            // no data is silently dropped.
            for row in table.rows() {
                merged.push_row(row.clone());
            }
        }
        self.replace_sheet(name, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        let mut t = RawTable::new(headers.iter().map(|h| h.to_string()).collect());
        for row in rows {
            t.push_row(row.iter().map(|c| c.to_string()).collect());
        }
        t
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let workbook = Workbook::open(dir.path()).unwrap();
        let t = table(&["Sku", "Price"], &[&["A-1", "10,00"]]);

        workbook.replace_sheet("prices", &t).unwrap();
        let loaded = workbook.read_sheet("prices").unwrap();
        assert_eq!(loaded, t);
    }

    #[test]
    fn missing_required_sheet_is_an_error() {
        let dir = tempdir().unwrap();
        let workbook = Workbook::open(dir.path()).unwrap();
        assert!(workbook.read_sheet("prices").is_err());
    }

    #[test]
    fn missing_optional_sheet_is_empty() {
        let dir = tempdir().unwrap();
        let workbook = Workbook::open(dir.path()).unwrap();
        let t = workbook.read_sheet_or_empty("revenue");
        assert!(t.is_empty());
        assert!(t.headers().is_empty());
    }

    #[test]
    fn append_writes_header_only_once() {
        let dir = tempdir().unwrap();
        let workbook = Workbook::open(dir.path()).unwrap();
        let first = table(&["Sku", "Price"], &[&["A-1", "10,00"]]);
        let second = table(&["Sku", "Price"], &[&["B-2", "20,00"]]);

        workbook.append_rows("prices", &first).unwrap();
        workbook.append_rows("prices", &second).unwrap();

        let merged = workbook.read_sheet("prices").unwrap();
        assert_eq!(merged.headers(), &["Sku", "Price"]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.cell(1, "Sku"), Some("B-2"));
    }

    #[test]
    fn append_aligns_reordered_columns() {
        let dir = tempdir().unwrap();
        let workbook = Workbook::open(dir.path()).unwrap();
        let first = table(&["Sku", "Price"], &[&["A-1", "10,00"]]);
        let reordered = table(&["Price", "Sku"], &[&["20,00", "B-2"]]);

        workbook.append_rows("prices", &first).unwrap();
        workbook.append_rows("prices", &reordered).unwrap();

        let merged = workbook.read_sheet("prices").unwrap();
        assert_eq!(merged.cell(1, "Sku"), Some("B-2"));
        assert_eq!(merged.cell(1, "Price"), Some("20,00"));
    }
}
