//! Declared survey schema: named sections of typed column descriptors.
//!
//! Reports are computed over the columns declared here rather than over
//! column names guessed from the export at runtime.

use serde::{Deserialize, Serialize};

use crate::table::Table;

/// Suffix of per-section score columns.
pub const SCORE_SUFFIX: &str = "_score";
/// Item index reserved for the "not administered" flag column.
pub const SKIP_SENTINEL: u32 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// One item response.
    Item,
    /// `<prefix>_999`, set when the subtest was not administered.
    Sentinel,
    /// `_time`, `_attempted`, `_incorrect`, `_correct` tallies.
    Summary,
    /// Aggregate performance measure for the section.
    Score,
    /// Background variable (gender, age, ...).
    Context,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    /// Phonological awareness part; gets a derived correct-answer total.
    Phonological,
    #[default]
    Subtest,
    Context,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        ColumnSpec {
            name: name.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub kind: SectionKind,
    pub columns: Vec<ColumnSpec>,
}

impl Section {
    /// Item columns `<prefix>_1` ..= `<prefix>_<count>`.
    pub fn items(key: &str, label: &str, prefix: &str, count: u32) -> Self {
        Section {
            key: key.to_string(),
            label: label.to_string(),
            kind: SectionKind::Subtest,
            columns: (1..=count)
                .map(|i| ColumnSpec::new(format!("{prefix}_{i}"), ColumnKind::Item))
                .collect(),
        }
    }

    pub fn context(key: &str, label: &str, names: &[&str]) -> Self {
        Section {
            key: key.to_string(),
            label: label.to_string(),
            kind: SectionKind::Context,
            columns: names
                .iter()
                .map(|name| ColumnSpec::new(*name, ColumnKind::Context))
                .collect(),
        }
    }

    pub fn phonological(mut self) -> Self {
        self.kind = SectionKind::Phonological;
        self
    }

    /// Appends `<prefix>_999`.
    pub fn with_sentinel(mut self, prefix: &str) -> Self {
        self.columns.push(ColumnSpec::new(
            format!("{prefix}_{SKIP_SENTINEL}"),
            ColumnKind::Sentinel,
        ));
        self
    }

    /// Appends the timed-subtest tallies and the score column.
    pub fn with_summaries(mut self, prefix: &str) -> Self {
        for suffix in ["_time", "_attempted", "_incorrect", "_correct"] {
            self.columns
                .push(ColumnSpec::new(format!("{prefix}{suffix}"), ColumnKind::Summary));
        }
        self.with_score(prefix)
    }

    pub fn with_score(mut self, prefix: &str) -> Self {
        self.columns
            .push(ColumnSpec::new(format!("{prefix}{SCORE_SUFFIX}"), ColumnKind::Score));
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn names_of(&self, kind: ColumnKind) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(move |c| c.kind == kind)
            .map(|c| c.name.as_str())
    }

    /// Name of the derived correct-answer total column.
    pub fn total_name(&self) -> String {
        format!("{}_total", self.key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub sections: Vec<Section>,
}

impl Schema {
    /// Student assessment instrument.
    pub fn students() -> Self {
        Schema {
            sections: vec![
                Section::items("fonologica_1", "Conciencia fonológica (parte 1)", "fonologica_1", 10)
                    .phonological(),
                Section::items("fonologica_2", "Conciencia fonológica (parte 2)", "fonologica_2", 10)
                    .phonological(),
                Section::items("fonologica_3", "Conciencia fonológica (parte 3)", "fonologica_3", 10)
                    .phonological(),
                Section::items("letters", "Reconocimiento de letras", "letters", 100)
                    .with_sentinel("letters")
                    .with_summaries("letters"),
                Section::items("nonwords", "Lectura de pseudopalabras", "nonwords", 50)
                    .with_sentinel("nonwords")
                    .with_summaries("nonwords"),
                Section::items("oral_reading", "Lectura oral", "oral_reading", 60)
                    .with_sentinel("oral_reading")
                    .with_summaries("oral_reading"),
                Section::items("oral_comp", "Comprensión oral", "oral_comp", 5)
                    .with_score("oral_comp"),
                Section::context(
                    "student_context",
                    "Contexto del estudiante",
                    &[
                        "student_gender",
                        "student_age",
                        "student_grade",
                        "preschool",
                        "home_language",
                        "books_at_home",
                        "reads_at_home",
                    ],
                ),
            ],
        }
    }

    /// Teacher questionnaire. No sections are declared, so reports cover
    /// every column of the export.
    pub fn teachers() -> Self {
        Schema::default()
    }

    /// Returns the declared sections, or a single section spanning every
    /// column of `table` when nothing is declared.
    pub fn sections_for(&self, table: &Table) -> Vec<Section> {
        if !self.sections.is_empty() {
            return self.sections.clone();
        }
        let names: Vec<&str> = table.headers().iter().map(String::as_str).collect();
        vec![Section::context("all", "All variables", &names)]
    }

    pub fn section(&self, key: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.key == key)
    }

    pub fn phonological(&self) -> impl Iterator<Item = &Section> {
        self.sections
            .iter()
            .filter(|s| s.kind == SectionKind::Phonological)
    }

    pub fn score_columns(&self) -> Vec<&str> {
        self.sections
            .iter()
            .flat_map(|s| s.names_of(ColumnKind::Score))
            .collect()
    }

    /// Declared columns the table does not carry.
    pub fn missing_columns(&self, table: &Table) -> Vec<&str> {
        self.sections
            .iter()
            .flat_map(|s| s.names())
            .filter(|name| !table.has_column(name))
            .collect()
    }
}
