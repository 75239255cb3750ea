//! Header-keyed tabular data as it arrives from a sheet or report export.
//!
//! A `RawTable` carries whatever headers the source produced; the
//! reconciliation stage is responsible for mapping them onto the canonical
//! schema before any typed processing happens.

use std::io::{Read, Write};
use std::path::Path;

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        RawTable {
            headers,
            rows: Vec::new(),
        }
    }

    /// Read a table from CSV, padding ragged rows out to the header width.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let width = headers.len();
        let mut rows = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            let mut row: Vec<String> = record.iter().map(|c| c.to_string()).collect();
            row.resize(width, String::new());
            row.truncate(width);
            rows.push(row);
        }

        Ok(RawTable { headers, rows })
    }

    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    pub fn to_csv_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.headers)?;
        for row in &self.rows {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn to_csv_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.to_csv_writer(file)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell lookup by row index and column name. Missing column or row yields `None`.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col)).map(|s| s.as_str())
    }

    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), String::new());
        row.truncate(self.headers.len());
        self.rows.push(row);
    }

    /// Rename the first header matching `from`. Returns whether a rename happened.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_index(from) {
            Some(idx) => {
                self.headers[idx] = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Append a column filled with `fill` in every existing row.
    pub fn add_column(&mut self, name: &str, fill: &str) {
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(fill.to_string());
        }
    }

    /// Overwrite every cell of an existing column.
    pub fn fill_column(&mut self, name: &str, values: &[String]) {
        if let Some(idx) = self.column_index(name) {
            for (row, value) in self.rows.iter_mut().zip(values.iter()) {
                row[idx] = value.clone();
            }
        }
    }

    /// Reorder columns to the given sequence, dropping any not listed.
    /// Columns named but absent from the table are skipped.
    pub fn select_columns(&self, names: &[&str]) -> RawTable {
        let indices: Vec<usize> = names
            .iter()
            .filter_map(|n| self.column_index(n))
            .collect();
        let headers = indices
            .iter()
            .map(|&i| self.headers[i].clone())
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        RawTable { headers, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
Sku,Price,Rank
A-1,10.00,1
B-2,20.00,2
";

    #[test]
    fn load_sample_csv() {
        let table = RawTable::from_csv_reader(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(table.headers(), &["Sku", "Price", "Rank"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, "Sku"), Some("A-1"));
        assert_eq!(table.cell(1, "Price"), Some("20.00"));
        assert_eq!(table.cell(0, "Missing"), None);
    }

    #[test]
    fn ragged_rows_are_padded() {
        let csv_data = "Sku,Price,Rank\nA-1,10.00\n";
        let table = RawTable::from_csv_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(table.cell(0, "Rank"), Some(""));
    }

    #[test]
    fn rename_and_add_column() {
        let mut table = RawTable::from_csv_reader(SAMPLE_CSV.as_bytes()).unwrap();
        assert!(table.rename_column("Sku", "Code"));
        assert!(!table.rename_column("Sku", "Code"));
        table.add_column("Category", "General");
        assert_eq!(table.cell(1, "Category"), Some("General"));
        assert_eq!(table.cell(0, "Code"), Some("A-1"));
    }

    #[test]
    fn select_columns_reorders_and_drops() {
        let table = RawTable::from_csv_reader(SAMPLE_CSV.as_bytes()).unwrap();
        let selected = table.select_columns(&["Rank", "Sku", "Absent"]);
        assert_eq!(selected.headers(), &["Rank", "Sku"]);
        assert_eq!(selected.cell(0, "Rank"), Some("1"));
        assert_eq!(selected.cell(0, "Sku"), Some("A-1"));
    }

    #[test]
    fn round_trips_through_csv() {
        let table = RawTable::from_csv_reader(SAMPLE_CSV.as_bytes()).unwrap();
        let mut buffer = Vec::new();
        table.to_csv_writer(&mut buffer).unwrap();
        let reloaded = RawTable::from_csv_reader(buffer.as_slice()).unwrap();
        assert_eq!(reloaded, table);
    }
}
