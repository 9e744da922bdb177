//! Per-enumerator submission and flag counts.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::checks::CheckKind;
use crate::table::{Subset, Table, TableError};

/// Label used for rows without an enumerator id.
pub const UNKNOWN_ENUMERATOR: &str = "(missing)";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumeratorSummary {
    pub enumerator: String,
    pub submissions: usize,
    pub flagged: BTreeMap<CheckKind, usize>,
}

/// Groups rows by enumerator and counts how many of each enumerator's rows
/// every check flagged. Sorted by enumerator id.
pub fn enumerator_summary(
    table: &Table,
    column: &str,
    checks: &[(CheckKind, &Subset<'_>)],
) -> Result<Vec<EnumeratorSummary>, TableError> {
    let ids = table.column(column)?;
    let mut by_id: BTreeMap<&str, EnumeratorSummary> = BTreeMap::new();

    for (row, id) in ids.iter().enumerate() {
        let id = id.unwrap_or(UNKNOWN_ENUMERATOR);
        let entry = by_id.entry(id).or_insert_with(|| EnumeratorSummary {
            enumerator: id.to_string(),
            submissions: 0,
            flagged: checks.iter().map(|(kind, _)| (*kind, 0)).collect(),
        });
        entry.submissions += 1;
        for (kind, subset) in checks {
            if subset.contains(row) {
                *entry.flagged.entry(*kind).or_default() += 1;
            }
        }
    }

    Ok(by_id.into_values().collect())
}
