//! End-to-end pipeline runs.
//!
//! ```text
//! extract → transform → load → build → export
//! ```
//!
//! Each step is also callable on its own; the CLI exposes them as
//! subcommands. Any error stops the pipeline.

use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::config::{Settings, SettingsError};
use crate::dataset::Dataset;
use crate::etl::{
    self, ExportError, ExportSummary, ExtractError, LoadError, SourceEntity, TransformError,
};
use crate::store::{StoreError, Warehouse};
use crate::warehouse::{BuildContext, BuildError, BuildReport, Orchestrator};

// ============================================================================
// Error Types
// ============================================================================

/// Any error that stops a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Extract failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("Transform failed: {0}")]
    Transform(#[from] TransformError),

    #[error("Load failed: {0}")]
    Load(#[from] LoadError),

    #[error("Build failed: {0}")]
    Build(#[from] BuildError),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    #[error("Warehouse error: {0}")]
    Store(#[from] StoreError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

// ============================================================================
// Steps
// ============================================================================

/// Read every raw source file.
pub fn extract(settings: &Settings) -> PipelineResult<Vec<(SourceEntity, Dataset)>> {
    let raw_dir = settings.paths.raw_data_dir()?;
    Ok(etl::extract_all(&raw_dir)?)
}

/// Extract and clean every source.
pub fn transform(settings: &Settings) -> PipelineResult<Vec<(SourceEntity, Dataset)>> {
    let raw = extract(settings)?;
    Ok(etl::transform_all(&raw, &settings.warehouse.counted_statuses)?)
}

/// Extract, clean and load every source into staging.
pub fn load(settings: &Settings, warehouse: &mut Warehouse) -> PipelineResult<Vec<(&'static str, u64)>> {
    let cleaned = transform(settings)?;
    Ok(etl::load_all(warehouse, &cleaned)?)
}

/// Build the derived tables from current staging data.
pub fn build(warehouse: &mut Warehouse, ctx: BuildContext) -> PipelineResult<BuildReport> {
    let report = Orchestrator::new(ctx)?.run(warehouse)?;
    Ok(report.into_result()?)
}

/// Export the configured tables.
pub fn export(settings: &Settings, warehouse: &Warehouse) -> PipelineResult<Vec<ExportSummary>> {
    let dir = settings.paths.export_dir()?;
    Ok(etl::export_all(warehouse, &settings.export, &dir)?)
}

// ============================================================================
// Full Run
// ============================================================================

/// Outcome of a successful full run.
#[derive(Debug)]
pub struct PipelineSummary {
    pub database: PathBuf,
    pub loaded: Vec<(&'static str, u64)>,
    pub report: BuildReport,
    pub exports: Vec<ExportSummary>,
}

/// Run every step against the configured database.
///
/// `as_of` defaults to the UTC clock at the start of the build.
pub fn run_pipeline(
    settings: &Settings,
    as_of: Option<NaiveDateTime>,
) -> PipelineResult<PipelineSummary> {
    tracing::info!("Starting Revanta pipeline");

    let database = settings.paths.database()?;
    let mut warehouse = Warehouse::open(&database)?;

    tracing::info!("[1/4] Extract, transform, load");
    let loaded = load(settings, &mut warehouse)?;

    tracing::info!("[2/4] Build warehouse");
    let ctx = match as_of {
        Some(ts) => BuildContext::from_settings(&settings.warehouse, ts),
        None => BuildContext::now(&settings.warehouse),
    };
    let report = build(&mut warehouse, ctx)?;

    tracing::info!("[3/4] Export");
    let exports = export(settings, &warehouse)?;

    tracing::info!(
        database = %database.display(),
        exports = exports.len(),
        "[4/4] Pipeline completed"
    );
    Ok(PipelineSummary {
        database,
        loaded,
        report,
        exports,
    })
}
