//! Correct-answer totals for the phonological awareness parts.

use serde::Serialize;

use crate::coerce::to_numeric;
use crate::schema::{ColumnKind, Schema, Section};
use crate::table::{Table, TableError};

/// Derived per-row column: number of items answered correctly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionTotal {
    pub section: String,
    pub column: String,
    pub values: Vec<u32>,
}

impl SectionTotal {
    pub fn as_f64(&self) -> Vec<f64> {
        self.values.iter().map(|v| f64::from(*v)).collect()
    }
}

/// Counts, per row, the section's item cells numerically equal to
/// `correct_value`. Missing or non-numeric cells count as not correct.
pub fn section_total(
    table: &Table,
    section: &Section,
    correct_value: f64,
) -> Result<SectionTotal, TableError> {
    let items = section
        .names_of(ColumnKind::Item)
        .map(|name| table.column(name))
        .collect::<Result<Vec<_>, _>>()?;

    let values = (0..table.n_rows())
        .map(|row| {
            items
                .iter()
                .filter(|item| to_numeric(item.get(row)) == Some(correct_value))
                .count() as u32
        })
        .collect();

    Ok(SectionTotal {
        section: section.key.clone(),
        column: section.total_name(),
        values,
    })
}

/// One total per phonological section, each computed independently.
pub fn phonological_totals(
    table: &Table,
    schema: &Schema,
    correct_value: f64,
) -> Vec<(String, Result<SectionTotal, TableError>)> {
    schema
        .phonological()
        .map(|section| {
            (
                section.key.clone(),
                section_total(table, section, correct_value),
            )
        })
        .collect()
}
