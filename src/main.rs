//! CLI entry point for the high frequency checks dashboard.
//!
//! Provides subcommands for the checks view, the analysis view, a full JSON
//! report, and a listing of the declared survey schema.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hfc_dashboard::checks::CheckKind;
use hfc_dashboard::config::{ConfigOverrides, DashboardConfig, Profile};
use hfc_dashboard::fetch::{BasicClient, load_source};
use hfc_dashboard::output::{print_pretty, write_json, write_subset_csv};
use hfc_dashboard::render::{render_report, write_rows};
use hfc_dashboard::report::DashboardReport;
use hfc_dashboard::table::Table;
use std::ffi::OsStr;
use std::io::Write;
use std::path::Path;
use tabled::Tabled;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "hfc_dashboard")]
#[command(about = "Data-quality checks for field survey exports", long_about = None)]
struct Cli {
    /// Path to file or URL to fetch; defaults to the profile's source
    #[arg(long, global = true, env = "HFC_SOURCE_URL", value_name = "FILE_OR_URL")]
    source: Option<String>,

    /// Survey variant, fixes duration bounds and the declared schema
    #[arg(long, global = true, value_enum, default_value_t = Profile::Teachers)]
    profile: Profile,

    /// JSON file overriding profile defaults
    #[arg(long, global = true)]
    config: Option<String>,

    /// Maximum flagged rows printed per check
    #[arg(long, global = true, default_value_t = 20)]
    max_rows: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the duration, location, status and duplicate checks
    Checks {
        /// Directory to write each check's flagged rows to as CSV
        #[arg(short, long)]
        export_dir: Option<String>,
    },
    /// Missing values, category frequencies and score statistics
    Analyze,
    /// Run every view and write the report as JSON
    Report {
        /// JSON file to write
        #[arg(short, long, default_value = "report.json")]
        output: String,
    },
    /// List the declared sections and their columns
    Schema,
}

fn init_logging() -> tracing_appender::non_blocking::WorkerGuard {
    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/hfc_dashboard.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("hfc_dashboard.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    file_guard
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file
    let _file_guard = init_logging();

    let cli = Cli::parse();

    let overrides = match &cli.config {
        Some(path) => ConfigOverrides::load(path)?,
        None => ConfigOverrides::default(),
    };
    let config = DashboardConfig::resolve(cli.profile, overrides)?;

    if let Commands::Schema = cli.command {
        return print_schema(&config);
    }

    let source = config.source_or(cli.source.clone())?;
    let table = load_table(&source).await?;

    let missing = config.schema.missing_columns(&table);
    if !missing.is_empty() {
        warn!(
            count = missing.len(),
            first = missing[0],
            "Declared columns absent from the export"
        );
    }

    let report = DashboardReport::new(&table, &source, &config);
    let report = match &cli.command {
        Commands::Checks { .. } => report.with_checks(&table, &config),
        Commands::Analyze => report.with_analysis(&table, &config),
        Commands::Report { .. } => report
            .with_checks(&table, &config)
            .with_analysis(&table, &config),
        Commands::Schema => unreachable!("handled above"),
    };
    print_pretty(&report);

    let mut stdout = std::io::stdout().lock();
    render_report(&mut stdout, &table, &report, cli.max_rows)?;
    stdout.flush()?;

    match cli.command {
        Commands::Checks {
            export_dir: Some(dir),
        } => export_flagged(&table, &config, &dir)?,
        Commands::Report { output } => write_json(Path::new(&output), &report)?,
        _ => {}
    }

    if !report.errors.is_empty() {
        error!(failed_views = report.errors.len(), "Some views could not be computed");
    }
    info!(rows = report.rows, "Finished");
    Ok(())
}

/// Loads and parses the survey export. Any failure here is fatal.
#[tracing::instrument]
async fn load_table(source: &str) -> Result<Table> {
    let client = BasicClient::new();
    let bytes = load_source(&client, source).await?;
    let table = Table::from_csv_bytes(&bytes).with_context(|| format!("failed to parse {source}"))?;
    info!(rows = table.n_rows(), columns = table.n_cols(), "Survey loaded");
    Ok(table)
}

/// Writes `<check>.csv` for every check that ran; checks that fail on a
/// missing column are skipped.
fn export_flagged(table: &Table, config: &DashboardConfig, dir: &str) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    for kind in CheckKind::ALL {
        match kind.run(table, config) {
            Ok(subset) => {
                let path = Path::new(dir).join(format!("{}.csv", kind.name()));
                write_subset_csv(&path, &subset)?;
                info!(check = kind.name(), rows = subset.len(), path = %path.display(), "Exported");
            }
            Err(e) => warn!(check = kind.name(), error = %e, "Export skipped"),
        }
    }
    Ok(())
}

#[derive(Tabled)]
struct SectionRow {
    section: String,
    label: String,
    kind: String,
    columns: usize,
    range: String,
}

fn print_schema(config: &DashboardConfig) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    if config.schema.sections.is_empty() {
        writeln!(
            stdout,
            "Profile {:?} declares no sections; reports cover every column of the export.",
            config.profile
        )?;
        return Ok(());
    }

    let rows: Vec<SectionRow> = config
        .schema
        .sections
        .iter()
        .map(|section| {
            let names: Vec<&str> = section.names().collect();
            let range = match names.as_slice() {
                [] => String::new(),
                [only] => only.to_string(),
                [first, .., last] => format!("{first} .. {last}"),
            };
            SectionRow {
                section: section.key.clone(),
                label: section.label.clone(),
                kind: format!("{:?}", section.kind).to_lowercase(),
                columns: names.len(),
                range,
            }
        })
        .collect();
    write_rows(&mut stdout, &rows)?;
    Ok(())
}
