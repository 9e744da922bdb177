//! Dashboard configuration: dataset profiles plus optional JSON overrides.
//!
//! A profile fixes the defaults for one survey variant. A JSON file can
//! override any part of it:
//! ```json
//! {
//!   "source": "https://example.org/students.csv",
//!   "duration": { "source": { "start_end": { "start": "start", "end": "end" } },
//!                 "min_minutes": 2.0, "max_minutes": 60.0 },
//!   "columns": { "status": "review_status" }
//! }
//! ```

use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::coerce::DurationUnit;
use crate::schema::Schema;

/// Published export of the El Salvador teacher questionnaire.
pub const TEACHERS_SOURCE_URL: &str = "https://www.dropbox.com/scl/fi/yzxvmu40j45utunxnqahd/ElS-ElSalvadorDocentes_27jun2023_Final.csv?rlkey=ewchky7rm9it9obsboq8v9ls4&dl=1";

pub const DEFAULT_STATUS_SENTINEL: &str = "Requires Approval";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Teacher questionnaire; duration read from its own column, 5 to 60 min.
    #[default]
    Teachers,
    /// Student assessment; duration computed from start/end, 2 to 60 min.
    Students,
}

/// Names of the record-level columns the checks read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub start: String,
    pub end: String,
    pub duration: String,
    pub latitude: String,
    pub longitude: String,
    pub status: String,
    pub enumerator: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        ColumnNames {
            start: "starttime".into(),
            end: "endtime".into(),
            duration: "Duration".into(),
            latitude: "Latitude".into(),
            longitude: "Longitude".into(),
            status: "Status".into(),
            enumerator: "enumerator".into(),
        }
    }
}

/// Where the interview duration comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationSource {
    /// Parse the duration column; bare numbers are read in `unit`.
    Column {
        column: String,
        #[serde(default)]
        unit: DurationUnit,
    },
    /// `end - start`.
    StartEnd { start: String, end: String },
}

impl DurationSource {
    /// Points the source at the duration columns named in `columns`,
    /// keeping its kind and unit.
    pub fn retarget(&mut self, columns: &ColumnNames) {
        match self {
            DurationSource::Column { column, .. } => *column = columns.duration.clone(),
            DurationSource::StartEnd { start, end } => {
                *start = columns.start.clone();
                *end = columns.end.clone();
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationRule {
    pub source: DurationSource,
    pub min_minutes: f64,
    pub max_minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardConfig {
    pub profile: Profile,
    pub source: Option<String>,
    pub columns: ColumnNames,
    pub duration: DurationRule,
    pub status_sentinel: String,
    /// Item value counted as a correct answer in section totals.
    pub correct_value: f64,
    /// Numeric variables with at most this many distinct values are treated
    /// as categorical.
    pub max_categories: usize,
    pub histogram_bins: usize,
    pub schema: Schema,
}

/// Partial configuration read from a JSON file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverrides {
    pub profile: Option<Profile>,
    pub source: Option<String>,
    pub columns: Option<ColumnNames>,
    pub duration: Option<DurationRule>,
    pub status_sentinel: Option<String>,
    pub correct_value: Option<f64>,
    pub max_categories: Option<usize>,
    pub histogram_bins: Option<usize>,
    pub schema: Option<Schema>,
}

impl ConfigOverrides {
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
        serde_json::from_str(&content).with_context(|| format!("invalid config in {path}"))
    }
}

impl DashboardConfig {
    pub fn for_profile(profile: Profile) -> Self {
        let columns = ColumnNames::default();
        match profile {
            Profile::Teachers => DashboardConfig {
                profile,
                source: Some(TEACHERS_SOURCE_URL.to_string()),
                duration: DurationRule {
                    source: DurationSource::Column {
                        column: columns.duration.clone(),
                        unit: DurationUnit::Minutes,
                    },
                    min_minutes: 5.0,
                    max_minutes: 60.0,
                },
                columns,
                status_sentinel: DEFAULT_STATUS_SENTINEL.to_string(),
                correct_value: 1.0,
                max_categories: 5,
                histogram_bins: 10,
                schema: Schema::teachers(),
            },
            Profile::Students => DashboardConfig {
                profile,
                source: None,
                duration: DurationRule {
                    source: DurationSource::StartEnd {
                        start: columns.start.clone(),
                        end: columns.end.clone(),
                    },
                    min_minutes: 2.0,
                    max_minutes: 60.0,
                },
                columns,
                status_sentinel: DEFAULT_STATUS_SENTINEL.to_string(),
                correct_value: 1.0,
                max_categories: 5,
                histogram_bins: 10,
                schema: Schema::students(),
            },
        }
    }

    /// Profile defaults with `overrides` laid on top. A profile named in the
    /// overrides replaces `profile` before the other fields are applied.
    pub fn resolve(profile: Profile, overrides: ConfigOverrides) -> Result<Self> {
        let mut config = Self::for_profile(overrides.profile.unwrap_or(profile));

        if let Some(source) = overrides.source {
            config.source = Some(source);
        }
        if let Some(columns) = overrides.columns {
            config.duration.source.retarget(&columns);
            config.columns = columns;
        }
        if let Some(duration) = overrides.duration {
            config.duration = duration;
        }
        if let Some(sentinel) = overrides.status_sentinel {
            config.status_sentinel = sentinel;
        }
        if let Some(value) = overrides.correct_value {
            config.correct_value = value;
        }
        if let Some(max) = overrides.max_categories {
            config.max_categories = max;
        }
        if let Some(bins) = overrides.histogram_bins {
            config.histogram_bins = bins;
        }
        if let Some(schema) = overrides.schema {
            config.schema = schema;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let DurationRule {
            min_minutes,
            max_minutes,
            ..
        } = self.duration;
        if !min_minutes.is_finite() || !max_minutes.is_finite() {
            return Err(anyhow!(
                "duration bounds must be finite: {min_minutes}, {max_minutes}"
            ));
        }
        if min_minutes > max_minutes {
            return Err(anyhow!(
                "duration bounds are inverted: {min_minutes} > {max_minutes}"
            ));
        }
        if self.histogram_bins == 0 {
            return Err(anyhow!("histogram_bins must be at least 1"));
        }
        Ok(())
    }

    /// Picks the data source: explicit argument first, then the configured one.
    pub fn source_or(&self, explicit: Option<String>) -> Result<String> {
        explicit.or_else(|| self.source.clone()).ok_or_else(|| {
            anyhow!(
                "no data source for profile {:?}; pass --source or set HFC_SOURCE_URL",
                self.profile
            )
        })
    }
}
