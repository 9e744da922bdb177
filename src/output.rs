//! Output formatting and persistence for dashboard reports.
//!
//! Supports debug pretty-printing, JSON report files, and CSV export of flagged rows.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

use crate::report::DashboardReport;
use crate::table::Subset;

/// Logs the report using Rust's debug pretty-print format.
pub fn print_pretty(report: &DashboardReport) {
    debug!("{:#?}", report);
}

/// Writes the report as pretty-printed JSON, replacing any existing file.
pub fn write_json(path: &Path, report: &DashboardReport) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, report)?;
    info!(path = %path.display(), "Report written");
    Ok(())
}

/// Writes the rows of `subset` to a CSV file with the source headers and a
/// leading `row` column holding the 1-based source row number.
pub fn write_subset_csv(path: &Path, subset: &Subset<'_>) -> Result<()> {
    debug!(path = %path.display(), rows = subset.len(), "Exporting flagged rows");

    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

    let mut header = vec!["row"];
    header.extend(subset.table().headers().iter().map(String::as_str));
    writer.write_record(&header)?;

    for (number, row) in subset.row_numbers().into_iter().zip(subset.iter()) {
        let number = number.to_string();
        let mut record = vec![number.as_str()];
        record.extend(row.iter().map(|cell| cell.as_deref().unwrap_or("")));
        writer.write_record(&record)?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DashboardConfig, Profile};
    use crate::table::Table;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(name)
    }

    fn sample() -> (Table, DashboardConfig) {
        let table = Table::new(
            vec!["Status", "Note"],
            vec![
                vec![Some("Approved".into()), None],
                vec![Some("Requires Approval".into()), Some("a, b".into())],
            ],
        );
        (table, DashboardConfig::for_profile(Profile::Teachers))
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        let (table, config) = sample();
        print_pretty(&DashboardReport::new(&table, "x.csv", &config));
    }

    #[test]
    fn test_write_json_round_trips_as_json() {
        let path = temp_path("hfc_dashboard_test_report.json");
        let _ = fs::remove_file(&path);

        let (table, config) = sample();
        let report = DashboardReport::new(&table, "x.csv", &config).with_checks(&table, &config);
        write_json(&path, &report).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["rows"], 2);
        assert_eq!(value["profile"], "teachers");
        assert!(value["errors"].as_array().unwrap().len() >= 2);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_subset_csv() {
        let path = temp_path("hfc_dashboard_test_subset.csv");
        let _ = fs::remove_file(&path);

        let (table, _) = sample();
        let subset = Subset::new(&table, vec![1]);
        write_subset_csv(&path, &subset).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines, vec!["row,Status,Note", "2,Requires Approval,\"a, b\""]);

        fs::remove_file(&path).unwrap();
    }
}
