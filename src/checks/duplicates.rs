use std::borrow::Cow;
use std::collections::HashSet;

use crate::coerce::to_numeric;
use crate::table::{Column, Subset, Table};

/// Comparison keys for one column. A column whose present cells all parse
/// as numbers is keyed by value, so `1` and `1.0` match; any other column is
/// keyed by its raw text.
fn column_keys<'a>(column: &Column<'a>) -> Vec<Option<Cow<'a, str>>> {
    let numbers: Option<Vec<Option<f64>>> = column
        .iter()
        .map(|raw| match raw {
            Some(raw) => to_numeric(Some(raw)).map(Some),
            None => Some(None),
        })
        .collect();
    match numbers {
        Some(numbers) => numbers
            .into_iter()
            .map(|n| n.map(|n| Cow::Owned(format!("{}", n + 0.0))))
            .collect(),
        None => column.iter().map(|raw| raw.map(Cow::Borrowed)).collect(),
    }
}

/// Rows identical across every column to an earlier row. The first
/// occurrence is not flagged; missing cells compare equal to each other.
#[tracing::instrument(skip(table), fields(rows = table.n_rows()))]
pub fn duplicate_check(table: &Table) -> Subset<'_> {
    let columns: Vec<Vec<Option<Cow<'_, str>>>> = table
        .headers()
        .iter()
        .filter_map(|name| table.column(name).ok())
        .map(|column| column_keys(&column))
        .collect();

    let mut seen = HashSet::with_capacity(table.n_rows());
    let flagged = (0..table.n_rows())
        .filter(|&row| {
            let key: Vec<Option<&str>> = columns.iter().map(|keys| keys[row].as_deref()).collect();
            !seen.insert(key)
        })
        .collect();
    Subset::new(table, flagged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[Option<&str>]) -> Vec<Option<String>> {
        cells.iter().map(|c| c.map(str::to_string)).collect()
    }

    #[test]
    fn test_later_copies_flagged() {
        let table = Table::new(
            vec!["id", "score"],
            vec![
                row(&[Some("a"), Some("1")]),
                row(&[Some("b"), Some("2")]),
                row(&[Some("a"), Some("1")]),
                row(&[Some("a"), Some("1")]),
            ],
        );
        assert_eq!(duplicate_check(&table).row_numbers(), vec![3, 4]);
    }

    #[test]
    fn test_nulls_compare_equal() {
        let table = Table::new(
            vec!["id", "score"],
            vec![row(&[Some("a"), None]), row(&[Some("a"), None])],
        );
        assert_eq!(duplicate_check(&table).row_numbers(), vec![2]);
    }

    #[test]
    fn test_numeric_columns_compare_by_value() {
        let table =
            Table::from_csv_bytes(b"id,Latitude,score\na,13.7,1\na,13.70,1.0\nb,13.7,1\n").unwrap();
        assert_eq!(duplicate_check(&table).row_numbers(), vec![2]);
    }

    #[test]
    fn test_text_columns_compare_raw() {
        let table = Table::from_csv_bytes(b"id,code\na,01\na,1\na,x\n").unwrap();
        assert!(duplicate_check(&table).is_empty());
    }

    #[test]
    fn test_partial_match_not_flagged() {
        let table = Table::new(
            vec!["id", "score"],
            vec![row(&[Some("a"), Some("1")]), row(&[Some("a"), Some("2")])],
        );
        assert!(duplicate_check(&table).is_empty());
    }
}
