use serde::Serialize;

use crate::analyzers::utility::pct;
use crate::schema::Section;
use crate::table::{Table, TableError};

/// Null count and rate of one variable over the full table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingValues {
    pub variable: String,
    pub null_count: usize,
    pub null_pct: f64,
}

/// Missing-value report for one declared section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionMissing {
    pub section: String,
    pub label: String,
    pub variables: Vec<MissingValues>,
}

/// Per-variable null counts; percentages are over every row of the table.
pub fn missing_values(table: &Table, variables: &[&str]) -> Result<Vec<MissingValues>, TableError> {
    let total = table.n_rows();
    variables
        .iter()
        .map(|name| {
            let null_count = table.column(name)?.null_count();
            Ok(MissingValues {
                variable: name.to_string(),
                null_count,
                null_pct: pct(null_count, total),
            })
        })
        .collect()
}

pub fn section_missing(table: &Table, section: &Section) -> Result<SectionMissing, TableError> {
    let names: Vec<&str> = section.names().collect();
    Ok(SectionMissing {
        section: section.key.clone(),
        label: section.label.clone(),
        variables: missing_values(table, &names)?,
    })
}
