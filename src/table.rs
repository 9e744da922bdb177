//! In-memory survey table parsed from a CSV export.
//!
//! Cells are kept as raw text; a cell is `None` when it is empty or one of
//! the usual spreadsheet NA spellings. Typed views are produced on demand by
//! [`crate::coerce`], so a malformed value never fails the load.

use csv::ReaderBuilder;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

/// Cell spellings read as missing values.
pub const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Error)]
pub enum TableError {
    #[error("column `{0}` not found in table")]
    MissingColumn(String),
    #[error("CSV has no header row")]
    NoHeader,
    #[error("CSV parse failed: {0}")]
    Csv(#[from] csv::Error),
}

/// Rectangular table of optional text cells with labelled columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Option<String>>>,
}

fn cell(raw: &str) -> Option<String> {
    if NA_TOKENS.contains(&raw) {
        None
    } else {
        Some(raw.to_string())
    }
}

impl Table {
    /// Builds a table from headers and rows. Rows are padded with `None` or
    /// truncated to the header width; repeated header names get the first
    /// free `.N` suffix.
    pub fn new<S: Into<String>>(headers: Vec<S>, rows: Vec<Vec<Option<String>>>) -> Self {
        let mut used: HashSet<String> = HashSet::new();
        let mut suffixes: HashMap<String, usize> = HashMap::new();
        let mut names = Vec::with_capacity(headers.len());
        for header in headers {
            let header = header.into();
            let mut name = header.clone();
            if used.contains(&name) {
                let counter = suffixes.entry(header.clone()).or_default();
                loop {
                    *counter += 1;
                    name = format!("{header}.{counter}");
                    if !used.contains(&name) {
                        break;
                    }
                }
            }
            used.insert(name.clone());
            names.push(name);
        }

        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        let width = names.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();

        Table {
            headers: names,
            index,
            rows,
        }
    }

    /// Parses CSV bytes with a header row.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not valid UTF-8 CSV or carry no header.
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self, TableError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if headers.is_empty() || headers.iter().all(String::is_empty) {
            return Err(TableError::NoHeader);
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(cell).collect());
        }

        let table = Table::new(headers, rows);
        debug!(
            rows = table.n_rows(),
            columns = table.n_cols(),
            "CSV parsed into table"
        );
        Ok(table)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.headers.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn row(&self, row: usize) -> &[Option<String>] {
        &self.rows[row]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Option<String>]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Looks up a column by name.
    ///
    /// # Errors
    ///
    /// [`TableError::MissingColumn`] when the table has no such column.
    pub fn column(&self, name: &str) -> Result<Column<'_>, TableError> {
        let idx = *self
            .index
            .get(name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))?;
        Ok(Column {
            table: self,
            name: &self.headers[idx],
            idx,
        })
    }
}

/// Borrowed view of one column.
#[derive(Debug, Clone, Copy)]
pub struct Column<'a> {
    table: &'a Table,
    name: &'a str,
    idx: usize,
}

impl<'a> Column<'a> {
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn get(&self, row: usize) -> Option<&'a str> {
        self.table.rows[row][self.idx].as_deref()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&'a str>> + 'a {
        let idx = self.idx;
        self.table.rows.iter().map(move |row| row[idx].as_deref())
    }

    pub fn len(&self) -> usize {
        self.table.n_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.table.n_rows() == 0
    }

    pub fn null_count(&self) -> usize {
        self.iter().filter(Option::is_none).count()
    }
}

/// Rows of a table selected by a check. Indices are 0-based and ascending.
#[derive(Debug, Clone)]
pub struct Subset<'a> {
    table: &'a Table,
    rows: Vec<usize>,
}

impl<'a> Subset<'a> {
    pub fn new(table: &'a Table, rows: Vec<usize>) -> Self {
        Subset { table, rows }
    }

    pub fn table(&self) -> &'a Table {
        self.table
    }

    pub fn indices(&self) -> &[usize] {
        &self.rows
    }

    /// 1-based row numbers, as shown to reviewers.
    pub fn row_numbers(&self) -> Vec<usize> {
        self.rows.iter().map(|r| r + 1).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, row: usize) -> bool {
        self.rows.binary_search(&row).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a [Option<String>]> + '_ {
        self.rows.iter().map(|&r| self.table.row(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_csv() {
        let table = Table::from_csv_bytes(b"Status,Latitude\nApproved,13.5\nRequires Approval,\n")
            .unwrap();

        assert_eq!(table.headers(), ["Status", "Latitude"]);
        assert_eq!(table.n_rows(), 2);
        let lat = table.column("Latitude").unwrap();
        assert_eq!(lat.get(0), Some("13.5"));
        assert_eq!(lat.get(1), None);
    }

    #[test]
    fn test_na_tokens_become_null() {
        let table = Table::from_csv_bytes(b"a,b,c,d\nNA,n/a,NULL,ok\n").unwrap();
        let row = table.row(0);
        assert_eq!(row[..3], [None::<String>, None, None]);
        assert_eq!(row[3].as_deref(), Some("ok"));
    }

    #[test]
    fn test_ragged_rows_are_padded_and_truncated() {
        let table = Table::from_csv_bytes(b"a,b,c\n1\n1,2,3,4\n").unwrap();
        assert_eq!(table.row(0), [Some("1".to_string()), None, None]);
        assert_eq!(table.row(1).len(), 3);
    }

    #[test]
    fn test_duplicate_headers_are_suffixed() {
        let table = Table::new(vec!["x", "x", "y", "x"], vec![]);
        assert_eq!(table.headers(), ["x", "x.1", "y", "x.2"]);
    }

    #[test]
    fn test_suffixed_headers_never_collide() {
        let table = Table::new(vec!["x", "x", "x.1"], vec![vec![
            Some("a".to_string()),
            Some("b".to_string()),
            Some("c".to_string()),
        ]]);
        assert_eq!(table.headers(), ["x", "x.1", "x.1.1"]);
        assert_eq!(table.column("x.1").unwrap().get(0), Some("b"));
        assert_eq!(table.column("x.1.1").unwrap().get(0), Some("c"));

        let table = Table::new(vec!["x", "x.1", "x"], vec![]);
        assert_eq!(table.headers(), ["x", "x.1", "x.2"]);
    }

    #[test]
    fn test_missing_column_is_error() {
        let table = Table::new(vec!["a"], vec![]);
        let err = table.column("Duration").unwrap_err();
        assert!(matches!(err, TableError::MissingColumn(ref name) if name == "Duration"));
    }

    #[test]
    fn test_invalid_utf8_is_error() {
        let result = Table::from_csv_bytes(b"a,b\n\xff\xfe,1\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_input_has_no_header() {
        assert!(matches!(
            Table::from_csv_bytes(b""),
            Err(TableError::NoHeader)
        ));
    }

    #[test]
    fn test_subset_row_numbers() {
        let table = Table::new(vec!["a"], vec![vec![None], vec![None], vec![None]]);
        let subset = Subset::new(&table, vec![0, 2]);
        assert_eq!(subset.row_numbers(), vec![1, 3]);
        assert!(subset.contains(2));
        assert!(!subset.contains(1));
        assert_eq!(subset.iter().count(), 2);
    }
}
