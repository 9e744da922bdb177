//! Normalized category frequencies for low-cardinality variables.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::analyzers::utility::pct;
use crate::coerce::to_numeric;
use crate::table::{Column, Table, TableError};

/// Percentage of non-missing rows falling in each observed category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryFrequencies {
    pub variable: String,
    pub frequencies: BTreeMap<String, f64>,
}

/// Categories × variables, zero where a variable never takes a category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrequencyTable {
    pub categories: Vec<String>,
    pub variables: Vec<String>,
    /// `cells[category][variable]`, in percent.
    pub cells: Vec<Vec<f64>>,
}

/// Category key of each non-missing cell. Numeric columns are keyed by
/// their parsed value so `1` and `1.0` fall together; any non-numeric cell
/// makes the whole column textual.
fn category_keys<'a>(column: &Column<'a>) -> (bool, Vec<String>) {
    let present: Vec<&str> = column.iter().flatten().collect();
    let numbers: Option<Vec<f64>> = present.iter().map(|raw| to_numeric(Some(*raw))).collect();
    match numbers {
        Some(numbers) => (true, numbers.iter().map(|n| format!("{n}")).collect()),
        None => (false, present.iter().map(|raw| raw.to_string()).collect()),
    }
}

/// Frequencies for each variable that is non-numeric or has at most
/// `max_categories` distinct values. Other variables are left out.
pub fn category_frequencies(
    table: &Table,
    variables: &[&str],
    max_categories: usize,
) -> Result<Vec<CategoryFrequencies>, TableError> {
    let mut out = Vec::new();
    for name in variables {
        let column = table.column(name)?;
        let (numeric, keys) = category_keys(&column);

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for key in keys.iter() {
            *counts.entry(key.clone()).or_default() += 1;
        }
        if numeric && counts.len() > max_categories {
            continue;
        }

        let total = keys.len();
        out.push(CategoryFrequencies {
            variable: name.to_string(),
            frequencies: counts
                .into_iter()
                .map(|(key, count)| (key, pct(count, total)))
                .collect(),
        });
    }
    Ok(out)
}

/// Numbers before text, numbers by value, text lexically.
fn category_order(a: &str, b: &str) -> Ordering {
    match (to_numeric(Some(a)), to_numeric(Some(b))) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Joins per-variable frequencies into one zero-filled table.
pub fn frequency_table(reports: &[CategoryFrequencies]) -> FrequencyTable {
    let mut categories: Vec<String> = reports
        .iter()
        .flat_map(|r| r.frequencies.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    categories.sort_by(|a, b| category_order(a, b));

    let cells = categories
        .iter()
        .map(|category| {
            reports
                .iter()
                .map(|r| r.frequencies.get(category).copied().unwrap_or(0.0))
                .collect()
        })
        .collect();

    FrequencyTable {
        variables: reports.iter().map(|r| r.variable.clone()).collect(),
        categories,
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_table(name: &str, values: &[Option<&str>]) -> Table {
        Table::new(
            vec![name],
            values.iter().map(|v| vec![v.map(str::to_string)]).collect(),
        )
    }

    #[test]
    fn test_percentages_sum_to_100() {
        let table = column_table(
            "gender",
            &[Some("F"), Some("M"), Some("F"), None, Some("F"), Some("M"), Some("X")],
        );
        let report = category_frequencies(&table, &["gender"], 5).unwrap();
        let total: f64 = report[0].frequencies.values().sum();

        assert!((total - 100.0).abs() < 1e-9);
        assert_eq!(report[0].frequencies["F"], 50.0);
    }

    #[test]
    fn test_high_cardinality_numeric_omitted() {
        let values: Vec<String> = (1..=6).map(|i| i.to_string()).collect();
        let cells: Vec<Option<&str>> = values.iter().map(|v| Some(v.as_str())).collect();
        let table = column_table("age", &cells);

        assert!(category_frequencies(&table, &["age"], 5).unwrap().is_empty());
        assert_eq!(category_frequencies(&table, &["age"], 6).unwrap().len(), 1);
    }

    #[test]
    fn test_text_columns_always_included() {
        let values: Vec<String> = (1..=8).map(|i| format!("school {i}")).collect();
        let cells: Vec<Option<&str>> = values.iter().map(|v| Some(v.as_str())).collect();
        let table = column_table("school", &cells);

        let report = category_frequencies(&table, &["school"], 5).unwrap();
        assert_eq!(report[0].frequencies.len(), 8);
    }

    #[test]
    fn test_numeric_categories_normalized() {
        let table = column_table("item", &[Some("1"), Some("1.0"), Some("0"), Some("0.0")]);
        let report = category_frequencies(&table, &["item"], 5).unwrap();
        assert_eq!(report[0].frequencies.len(), 2);
        assert_eq!(report[0].frequencies["1"], 50.0);
    }

    #[test]
    fn test_table_zero_fills() {
        let reports = vec![
            CategoryFrequencies {
                variable: "a".into(),
                frequencies: BTreeMap::from([("1".into(), 100.0)]),
            },
            CategoryFrequencies {
                variable: "b".into(),
                frequencies: BTreeMap::from([("10".into(), 25.0), ("2".into(), 75.0)]),
            },
        ];
        let table = frequency_table(&reports);

        assert_eq!(table.categories, vec!["1", "2", "10"]);
        assert_eq!(table.variables, vec!["a", "b"]);
        assert_eq!(
            table.cells,
            vec![vec![100.0, 0.0], vec![0.0, 75.0], vec![0.0, 25.0]]
        );
    }

    #[test]
    fn test_repeatable() {
        let table = column_table("g", &[Some("F"), Some("M"), Some("M")]);
        let first = category_frequencies(&table, &["g"], 5).unwrap();
        let second = category_frequencies(&table, &["g"], 5).unwrap();
        assert_eq!(first, second);
    }
}
