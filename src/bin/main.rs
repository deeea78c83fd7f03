//! Revanta CLI - build the e-commerce analytics warehouse
//!
//! Usage:
//!   revanta run [--as-of <timestamp>]
//!   revanta build [--policy continue]
//!   revanta export [--format csv]
//!   revanta plan
//!
//! Examples:
//!   revanta --config revanta.toml run
//!   revanta build --as-of "2018-10-01 00:00:00"
//!   revanta schema --print

use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand, ValueEnum};
use revanta::config::{ExportFormat, FailurePolicy, Settings};
use revanta::etl;
use revanta::logging::{init_logging, LogConfig};
use revanta::pipeline;
use revanta::schema;
use revanta::store::Warehouse;
use revanta::warehouse::{BuildContext, BuildGraph, BuildReport, ModelStatus};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "revanta")]
#[command(about = "Revanta - e-commerce ETL pipeline and dimensional warehouse builder")]
#[command(version)]
struct Cli {
    /// Path to a revanta.toml configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Reference time for recency calculations (default: now, UTC)
    #[arg(long, global = true, value_parser = parse_as_of)]
    as_of: Option<NaiveDateTime>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read the raw CSV files and report their sizes
    Extract,

    /// Extract and clean the raw files without loading them
    Transform,

    /// Extract, clean and load the staging tables
    Load,

    /// Build dimensions, facts, marts and analytics from staging
    Build {
        /// Override the configured failure policy
        #[arg(long)]
        policy: Option<PolicyArg>,
    },

    /// Export the configured tables for BI tools
    Export {
        /// Override the configured export format
        #[arg(short, long)]
        format: Option<FormatArg>,
    },

    /// Convert every CSV file in the export directory to XLSX
    Convert {
        /// Directory to convert (default: the export directory)
        dir: Option<PathBuf>,
    },

    /// Run the full pipeline: extract, transform, load, build, export
    Run,

    /// Apply the warehouse schema
    Schema {
        /// Print the DDL instead of applying it
        #[arg(long)]
        print: bool,
    },

    /// Print the validated build order
    Plan,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    FailFast,
    Continue,
}

impl From<PolicyArg> for FailurePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::FailFast => FailurePolicy::FailFast,
            PolicyArg::Continue => FailurePolicy::Continue,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Xlsx,
    Csv,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Xlsx => ExportFormat::Xlsx,
            FormatArg::Csv => ExportFormat::Csv,
        }
    }
}

fn parse_as_of(s: &str) -> Result<NaiveDateTime, String> {
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| format!("invalid timestamp '{}': expected YYYY-MM-DD[ HH:MM:SS]", s))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Only full runs keep a log file.
    let log_dir = match (&cli.command, settings.paths.log_dir()) {
        (Commands::Run, Ok(dir)) => dir,
        (Commands::Run, Err(e)) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
        _ => None,
    };
    let log_file = match init_logging(LogConfig {
        verbose: cli.verbose,
        log_dir: log_dir.as_deref(),
    }) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Logging error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Extract => cmd_extract(&settings),
        Commands::Transform => cmd_transform(&settings),
        Commands::Load => cmd_load(&settings),
        Commands::Build { policy } => cmd_build(&settings, cli.as_of, policy),
        Commands::Export { format } => cmd_export(settings, format),
        Commands::Convert { dir } => cmd_convert(&settings, dir),
        Commands::Run => cmd_run(&settings, cli.as_of, log_file),
        Commands::Schema { print } => cmd_schema(&settings, print),
        Commands::Plan => cmd_plan(),
    }
}

fn open_warehouse(settings: &Settings) -> Result<Warehouse, String> {
    let path = settings.paths.database().map_err(|e| e.to_string())?;
    Warehouse::open(&path).map_err(|e| format!("Error opening '{}': {}", path.display(), e))
}

fn print_counts<'a>(rows: impl IntoIterator<Item = (&'a str, usize)>) {
    for (name, count) in rows {
        println!("  {:<35} {:>10}", name, count);
    }
}

fn cmd_extract(settings: &Settings) -> ExitCode {
    match pipeline::extract(settings) {
        Ok(raw) => {
            println!("Extracted:");
            print_counts(raw.iter().map(|(entity, data)| (entity.file_name(), data.len())));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_transform(settings: &Settings) -> ExitCode {
    match pipeline::transform(settings) {
        Ok(cleaned) => {
            println!("Transformed:");
            print_counts(cleaned.iter().map(|(entity, data)| (entity.as_str(), data.len())));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_load(settings: &Settings) -> ExitCode {
    let mut warehouse = match open_warehouse(settings) {
        Ok(wh) => wh,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match pipeline::load(settings, &mut warehouse) {
        Ok(loaded) => {
            println!("Loaded into {}:", warehouse.location());
            print_counts(loaded.iter().map(|(table, n)| (*table, *n as usize)));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_report(report: &BuildReport) {
    println!("Build as of {} ({}):", report.as_of, report.state);
    for outcome in &report.outcomes {
        let status = match &outcome.status {
            ModelStatus::Built => format!("{} rows", outcome.rows.unwrap_or(0)),
            ModelStatus::Failed(message) => format!("FAILED: {}", message),
            ModelStatus::Skipped => "skipped".to_string(),
        };
        println!("  {:<12} {:<35} {}", outcome.layer.as_str(), outcome.model, status);
    }
}

fn cmd_build(settings: &Settings, as_of: Option<NaiveDateTime>, policy: Option<PolicyArg>) -> ExitCode {
    let mut warehouse = match open_warehouse(settings) {
        Ok(wh) => wh,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut ctx = match as_of {
        Some(ts) => BuildContext::from_settings(&settings.warehouse, ts),
        None => BuildContext::now(&settings.warehouse),
    };
    if let Some(policy) = policy {
        ctx = ctx.with_failure_policy(policy.into());
    }

    let orchestrator = match revanta::warehouse::Orchestrator::new(ctx) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match orchestrator.run(&mut warehouse) {
        Ok(report) => {
            print_report(&report);
            match report.into_result() {
                Ok(_) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("{}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_export(mut settings: Settings, format: Option<FormatArg>) -> ExitCode {
    if let Some(format) = format {
        settings.export.format = format.into();
    }
    let warehouse = match open_warehouse(&settings) {
        Ok(wh) => wh,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match pipeline::export(&settings, &warehouse) {
        Ok(exports) => {
            for export in &exports {
                println!(
                    "  {} → {} (rows: {}, columns: {})",
                    export.table,
                    export.path.display(),
                    export.rows,
                    export.columns
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_convert(settings: &Settings, dir: Option<PathBuf>) -> ExitCode {
    let dir = match dir.map(Ok).unwrap_or_else(|| settings.paths.export_dir()) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match etl::export::convert_csv_dir(&dir) {
        Ok(converted) if converted.is_empty() => {
            eprintln!("No CSV files found in {}", dir.display());
            ExitCode::FAILURE
        }
        Ok(converted) => {
            print_counts(converted.iter().map(|c| (c.table.as_str(), c.rows)));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_run(settings: &Settings, as_of: Option<NaiveDateTime>, log_file: Option<PathBuf>) -> ExitCode {
    match pipeline::run_pipeline(settings, as_of) {
        Ok(summary) => {
            print_report(&summary.report);
            println!();
            println!("Database:   {}", summary.database.display());
            println!("BI exports: {} files", summary.exports.len());
            if let Some(path) = log_file {
                println!("Log:        {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Pipeline failed");
            eprintln!("Pipeline failed: {}", e);
            if let Some(path) = log_file {
                eprintln!("Check log for details: {}", path.display());
            }
            ExitCode::FAILURE
        }
    }
}

fn cmd_schema(settings: &Settings, print: bool) -> ExitCode {
    if print {
        println!("{}", schema::schema_sql());
        return ExitCode::SUCCESS;
    }

    let mut warehouse = match open_warehouse(settings) {
        Ok(wh) => wh,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    match schema::apply(&mut warehouse) {
        Ok(()) => {
            println!("Schema applied to {}", warehouse.location());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_plan() -> ExitCode {
    match BuildGraph::standard() {
        Ok(graph) => {
            print!("{}", graph.plan());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Invalid build graph: {}", e);
            ExitCode::FAILURE
        }
    }
}
