use crate::table::{Subset, Table, TableError};

/// Rows whose status equals `sentinel` exactly.
#[tracing::instrument(skip(table), fields(rows = table.n_rows()))]
pub fn status_check<'a>(
    table: &'a Table,
    column: &str,
    sentinel: &str,
) -> Result<Subset<'a>, TableError> {
    let flagged = table
        .column(column)?
        .iter()
        .enumerate()
        .filter(|(_, status)| *status == Some(sentinel))
        .map(|(row, _)| row)
        .collect();
    Ok(Subset::new(table, flagged))
}
