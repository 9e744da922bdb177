//! Row-level validation rules.
//!
//! Every check takes the full table and returns the [`Subset`] of rows that
//! violate its predicate. Checks never mutate the table and do not depend on
//! each other.

pub mod duplicates;
pub mod duration;
pub mod location;
pub mod status;

use serde::Serialize;

use crate::config::DashboardConfig;
use crate::table::{Subset, Table, TableError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Duration,
    Location,
    Status,
    Duplicates,
}

impl CheckKind {
    pub const ALL: [CheckKind; 4] = [
        CheckKind::Duration,
        CheckKind::Location,
        CheckKind::Status,
        CheckKind::Duplicates,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CheckKind::Duration => "duration",
            CheckKind::Location => "location",
            CheckKind::Status => "status",
            CheckKind::Duplicates => "duplicates",
        }
    }

    /// Reviewer-facing title of the flagged set.
    pub fn describe(&self, config: &DashboardConfig) -> String {
        match self {
            CheckKind::Duration => format!(
                "Interviews with duration outside the reasonable range ({} - {} min)",
                config.duration.min_minutes, config.duration.max_minutes
            ),
            CheckKind::Location => "Records with invalid locations".to_string(),
            CheckKind::Status => format!("Surveys with status \"{}\"", config.status_sentinel),
            CheckKind::Duplicates => "Duplicate records".to_string(),
        }
    }

    /// Applies this rule to `table`.
    ///
    /// # Errors
    ///
    /// [`TableError::MissingColumn`] when a column the rule reads is absent.
    pub fn run<'a>(
        &self,
        table: &'a Table,
        config: &DashboardConfig,
    ) -> Result<Subset<'a>, TableError> {
        match self {
            CheckKind::Duration => duration::duration_check(table, &config.duration),
            CheckKind::Location => location::location_check(
                table,
                &config.columns.latitude,
                &config.columns.longitude,
            ),
            CheckKind::Status => {
                status::status_check(table, &config.columns.status, &config.status_sentinel)
            }
            CheckKind::Duplicates => Ok(duplicates::duplicate_check(table)),
        }
    }
}
