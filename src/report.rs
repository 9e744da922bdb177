//! Assembly of the dashboard report from checks and aggregations.
//!
//! Each view is built independently: a view that fails (typically because
//! an expected column is absent) is recorded in [`DashboardReport::errors`]
//! and the remaining views are still produced.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::Tabled;
use tracing::{info, warn};

use crate::analyzers::describe::numeric_values;
use crate::analyzers::distribution::{Distribution, distribution};
use crate::analyzers::enumerator::{EnumeratorSummary, enumerator_summary};
use crate::analyzers::frequency::{FrequencyTable, category_frequencies, frequency_table};
use crate::analyzers::missing::{SectionMissing, section_missing};
use crate::analyzers::totals::phonological_totals;
use crate::checks::duration::{derive_durations, duration_seconds};
use crate::checks::location::{GeoPoint, valid_points};
use crate::checks::CheckKind;
use crate::config::{DashboardConfig, Profile};
use crate::schema::SCORE_SUFFIX;
use crate::table::{Subset, Table, TableError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckReport {
    pub check: CheckKind,
    pub description: String,
    pub flagged: usize,
    /// 1-based row numbers.
    pub rows: Vec<usize>,
}

impl CheckReport {
    fn from_subset(kind: CheckKind, subset: &Subset<'_>, config: &DashboardConfig) -> Self {
        CheckReport {
            check: kind,
            description: kind.describe(config),
            flagged: subset.len(),
            rows: subset.row_numbers(),
        }
    }
}

/// A view that could not be computed.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct ViewError {
    pub view: String,
    pub error: String,
}

/// The high frequency checks tab.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChecksView {
    pub checks: Vec<CheckReport>,
    /// Duration per row in seconds, in submission order.
    pub duration_seconds: Vec<Option<f64>>,
    pub map_points: Vec<GeoPoint>,
    pub enumerators: Vec<EnumeratorSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionFrequencies {
    pub section: String,
    pub label: String,
    pub table: FrequencyTable,
}

/// The interactive analysis tab.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisView {
    pub missing: Vec<SectionMissing>,
    pub frequencies: Vec<SectionFrequencies>,
    pub scores: Vec<Distribution>,
    pub section_totals: Vec<Distribution>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub profile: Profile,
    pub rows: usize,
    pub columns: usize,
    pub checks: Option<ChecksView>,
    pub analysis: Option<AnalysisView>,
    pub errors: Vec<ViewError>,
}

/// Unwraps a view result, recording the failure under `view`.
fn record<T>(errors: &mut Vec<ViewError>, view: &str, result: Result<T, TableError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(view, error = %e, "View skipped");
            errors.push(ViewError {
                view: view.to_string(),
                error: e.to_string(),
            });
            None
        }
    }
}

impl ChecksView {
    #[tracing::instrument(skip_all, fields(rows = table.n_rows()))]
    pub fn build(table: &Table, config: &DashboardConfig, errors: &mut Vec<ViewError>) -> Self {
        let mut subsets = Vec::new();
        for kind in CheckKind::ALL {
            let view = format!("checks.{}", kind.name());
            if let Some(subset) = record(errors, &view, kind.run(table, config)) {
                info!(check = kind.name(), flagged = subset.len(), "Check complete");
                subsets.push((kind, subset));
            }
        }

        let checks = subsets
            .iter()
            .map(|(kind, subset)| CheckReport::from_subset(*kind, subset, config))
            .collect();

        let series = record(
            errors,
            "checks.duration_series",
            derive_durations(table, &config.duration.source),
        )
        .map(|d| duration_seconds(&d))
        .unwrap_or_default();

        let map_points = record(
            errors,
            "checks.map",
            valid_points(table, &config.columns.latitude, &config.columns.longitude),
        )
        .unwrap_or_default();

        let flagged: Vec<(CheckKind, &Subset<'_>)> =
            subsets.iter().map(|(kind, subset)| (*kind, subset)).collect();
        let enumerators = record(
            errors,
            "checks.enumerators",
            enumerator_summary(table, &config.columns.enumerator, &flagged),
        )
        .unwrap_or_default();

        ChecksView {
            checks,
            duration_seconds: series,
            map_points,
            enumerators,
        }
    }
}

impl AnalysisView {
    #[tracing::instrument(skip_all, fields(rows = table.n_rows()))]
    pub fn build(table: &Table, config: &DashboardConfig, errors: &mut Vec<ViewError>) -> Self {
        let sections = config.schema.sections_for(table);
        let mut view = AnalysisView::default();

        for section in &sections {
            let name = format!("analysis.missing.{}", section.key);
            if let Some(missing) = record(errors, &name, section_missing(table, section)) {
                view.missing.push(missing);
            }

            let names: Vec<&str> = section.names().collect();
            let name = format!("analysis.frequencies.{}", section.key);
            let result = category_frequencies(table, &names, config.max_categories);
            if let Some(reports) = record(errors, &name, result) {
                view.frequencies.push(SectionFrequencies {
                    section: section.key.clone(),
                    label: section.label.clone(),
                    table: frequency_table(&reports),
                });
            }
        }

        for variable in score_columns(table, config) {
            let name = format!("analysis.scores.{variable}");
            if let Some(values) = record(errors, &name, numeric_values(table, &variable)) {
                view.scores
                    .push(distribution(&variable, &values, config.histogram_bins));
            }
        }

        for (key, total) in phonological_totals(table, &config.schema, config.correct_value) {
            let name = format!("analysis.totals.{key}");
            if let Some(total) = record(errors, &name, total) {
                view.section_totals.push(distribution(
                    &total.column,
                    &total.as_f64(),
                    config.histogram_bins,
                ));
            }
        }

        view
    }
}

/// Declared score columns, or every `_score` column of the export when the
/// schema declares none.
fn score_columns(table: &Table, config: &DashboardConfig) -> Vec<String> {
    let declared = config.schema.score_columns();
    if !declared.is_empty() {
        return declared.into_iter().map(str::to_string).collect();
    }
    table
        .headers()
        .iter()
        .filter(|h| h.ends_with(SCORE_SUFFIX))
        .cloned()
        .collect()
}

impl DashboardReport {
    pub fn new(table: &Table, source: &str, config: &DashboardConfig) -> Self {
        DashboardReport {
            generated_at: Utc::now(),
            source: source.to_string(),
            profile: config.profile,
            rows: table.n_rows(),
            columns: table.n_cols(),
            checks: None,
            analysis: None,
            errors: Vec::new(),
        }
    }

    pub fn with_checks(mut self, table: &Table, config: &DashboardConfig) -> Self {
        self.checks = Some(ChecksView::build(table, config, &mut self.errors));
        self
    }

    pub fn with_analysis(mut self, table: &Table, config: &DashboardConfig) -> Self {
        self.analysis = Some(AnalysisView::build(table, config, &mut self.errors));
        self
    }

    /// Full report: both views.
    pub fn build(table: &Table, source: &str, config: &DashboardConfig) -> Self {
        Self::new(table, source, config)
            .with_checks(table, config)
            .with_analysis(table, config)
    }
}
