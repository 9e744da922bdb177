//! Plain-text rendering of the dashboard for terminal review.

use std::io::{self, Write};

use tabled::builder::Builder;
use tabled::{Table as TextTable, Tabled};

use crate::analyzers::describe::Describe;
use crate::analyzers::distribution::Distribution;
use crate::report::{AnalysisView, ChecksView, DashboardReport};
use crate::table::Table;

const BAR_WIDTH: usize = 40;
/// Columns shown per flagged row; wide exports are cut to the leading ones.
const PREVIEW_COLUMNS: usize = 8;

#[derive(Debug, Clone, Tabled)]
struct MissingRow {
    variable: String,
    missing: usize,
    #[tabled(rename = "%")]
    pct: String,
    #[tabled(rename = "")]
    bar: String,
}

#[derive(Debug, Clone, Tabled)]
struct StatsRow {
    variable: String,
    count: usize,
    mean: String,
    std: String,
    min: String,
    #[tabled(rename = "25%")]
    q25: String,
    #[tabled(rename = "50%")]
    median: String,
    #[tabled(rename = "75%")]
    q75: String,
    max: String,
}

impl From<&Describe> for StatsRow {
    fn from(s: &Describe) -> Self {
        StatsRow {
            variable: s.variable.clone(),
            count: s.count,
            mean: fmt_opt(s.mean),
            std: fmt_opt(s.std),
            min: fmt_opt(s.min),
            q25: fmt_opt(s.q25),
            median: fmt_opt(s.median),
            q75: fmt_opt(s.q75),
            max: fmt_opt(s.max),
        }
    }
}

#[derive(Debug, Clone, Tabled)]
struct HistogramRow {
    bin: String,
    count: usize,
    #[tabled(rename = "")]
    bar: String,
}

/// Writes rows of a `Tabled` type as a text table.
pub fn write_rows<W: Write, T: Tabled>(w: &mut W, rows: &[T]) -> io::Result<()> {
    writeln!(w, "{}", TextTable::new(rows))
}

/// Writes a text table whose columns are only known at runtime.
pub fn write_grid<W: Write>(w: &mut W, header: Vec<String>, records: Vec<Vec<String>>) -> io::Result<()> {
    let mut builder = Builder::default();
    builder.push_record(header);
    for record in records {
        builder.push_record(record);
    }
    writeln!(w, "{}", builder.build())
}

fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 {
        return String::new();
    }
    "#".repeat(((value / max) * BAR_WIDTH as f64).round() as usize)
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".to_string())
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn render_report<W: Write>(w: &mut W, table: &Table, report: &DashboardReport, max_rows: usize) -> io::Result<()> {
    writeln!(w, "High Frequency Checks Dashboard")?;
    writeln!(
        w,
        "source: {}  profile: {:?}  rows: {}  columns: {}  generated: {}",
        report.source, report.profile, report.rows, report.columns, report.generated_at
    )?;

    if let Some(checks) = &report.checks {
        render_checks(w, table, checks, max_rows)?;
    }
    if let Some(analysis) = &report.analysis {
        render_analysis(w, analysis)?;
    }

    if !report.errors.is_empty() {
        writeln!(w, "\nViews not available")?;
        write_rows(w, &report.errors)?;
    }
    Ok(())
}

pub fn render_checks<W: Write>(w: &mut W, table: &Table, view: &ChecksView, max_rows: usize) -> io::Result<()> {
    let shown = table.n_cols().min(PREVIEW_COLUMNS);
    let mut headers = vec!["row".to_string()];
    headers.extend(table.headers()[..shown].iter().cloned());

    for check in &view.checks {
        writeln!(w, "\n{} ({} rows)", check.description, check.flagged)?;
        if check.rows.is_empty() {
            continue;
        }
        let rows: Vec<Vec<String>> = check
            .rows
            .iter()
            .take(max_rows)
            .map(|&number| {
                let mut cells = vec![number.to_string()];
                cells.extend(
                    table.row(number - 1)[..shown]
                        .iter()
                        .map(|c| c.clone().unwrap_or_default()),
                );
                cells
            })
            .collect();
        write_grid(w, headers.clone(), rows)?;
        if check.rows.len() > max_rows {
            writeln!(w, "... {} more", check.rows.len() - max_rows)?;
        }
    }

    let seconds: Vec<f64> = view.duration_seconds.iter().flatten().copied().collect();
    if !seconds.is_empty() {
        let summary = Describe::from_values("duration_seconds", &seconds);
        writeln!(
            w,
            "\nDuration (s): {} parsed of {}, min {}, median {}, max {}",
            summary.count,
            view.duration_seconds.len(),
            fmt_opt(summary.min),
            fmt_opt(summary.median),
            fmt_opt(summary.max)
        )?;
    }

    if !view.map_points.is_empty() {
        let lats = view.map_points.iter().map(|p| p.lat);
        let lons = view.map_points.iter().map(|p| p.lon);
        writeln!(
            w,
            "Map: {} valid points, lat [{:.4}, {:.4}], lon [{:.4}, {:.4}]",
            view.map_points.len(),
            lats.clone().fold(f64::INFINITY, f64::min),
            lats.fold(f64::NEG_INFINITY, f64::max),
            lons.clone().fold(f64::INFINITY, f64::min),
            lons.fold(f64::NEG_INFINITY, f64::max),
        )?;
    }

    if let Some(first) = view.enumerators.first() {
        writeln!(w, "\nSubmissions by enumerator")?;
        let mut headers = to_strings(&["enumerator", "submissions"]);
        headers.extend(first.flagged.keys().map(|k| k.name().to_string()));
        let rows: Vec<Vec<String>> = view
            .enumerators
            .iter()
            .map(|e| {
                let mut cells = vec![e.enumerator.clone(), e.submissions.to_string()];
                cells.extend(e.flagged.values().map(|n| n.to_string()));
                cells
            })
            .collect();
        write_grid(w, headers, rows)?;
    }
    Ok(())
}

fn render_distribution<W: Write>(w: &mut W, dist: &Distribution) -> io::Result<()> {
    writeln!(w, "\n{}", dist.summary.variable)?;
    let max = dist.histogram.iter().map(|b| b.count).max().unwrap_or(0) as f64;
    let rows: Vec<HistogramRow> = dist
        .histogram
        .iter()
        .map(|bin| HistogramRow {
            bin: format!("[{:.2}, {:.2}]", bin.lower, bin.upper),
            count: bin.count,
            bar: bar(bin.count as f64, max),
        })
        .collect();
    if !rows.is_empty() {
        write_rows(w, &rows)?;
    }
    if let Some(b) = &dist.box_plot {
        writeln!(
            w,
            "  box: whiskers {:.2}..{:.2}, q1 {:.2}, median {:.2}, q3 {:.2}, {} outliers",
            b.lower_whisker,
            b.upper_whisker,
            b.q1,
            b.median,
            b.q3,
            b.outliers.len()
        )?;
    }
    Ok(())
}

pub fn render_analysis<W: Write>(w: &mut W, view: &AnalysisView) -> io::Result<()> {
    for section in &view.missing {
        writeln!(w, "\nMissing values: {}", section.label)?;
        let max = section
            .variables
            .iter()
            .map(|v| v.null_count)
            .max()
            .unwrap_or(0) as f64;
        let rows: Vec<MissingRow> = section
            .variables
            .iter()
            .map(|v| MissingRow {
                variable: v.variable.clone(),
                missing: v.null_count,
                pct: format!("{:.2}", v.null_pct),
                bar: bar(v.null_count as f64, max),
            })
            .collect();
        write_rows(w, &rows)?;
    }

    for section in &view.frequencies {
        if section.table.variables.is_empty() {
            continue;
        }
        writeln!(w, "\nCategory frequencies (%): {}", section.label)?;
        let mut headers = vec!["category".to_string()];
        headers.extend(section.table.variables.iter().cloned());
        let rows: Vec<Vec<String>> = section
            .table
            .categories
            .iter()
            .zip(&section.table.cells)
            .map(|(category, cells)| {
                let mut row = vec![category.clone()];
                row.extend(cells.iter().map(|c| format!("{c:.2}")));
                row
            })
            .collect();
        write_grid(w, headers, rows)?;
    }

    let stats: Vec<StatsRow> = view
        .scores
        .iter()
        .chain(&view.section_totals)
        .map(|d| StatsRow::from(&d.summary))
        .collect();
    if !stats.is_empty() {
        writeln!(w, "\nDescriptive statistics")?;
        write_rows(w, &stats)?;
    }

    for dist in view.scores.iter().chain(&view.section_totals) {
        render_distribution(w, dist)?;
    }
    Ok(())
}
