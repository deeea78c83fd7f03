//! Runs the warehouse build.
//!
//! ```text
//! Idle → SchemaReady → DimensionsBuilt → FactsBuilt → MartsBuilt → AnalyticsBuilt → Done
//!   └──────────────┴────────────────┴────────────┴───────────┴──────────────┴──▶ Failed
//! ```
//!
//! The schema is applied first, then every model runs in plan order. Schema
//! and graph errors always abort. A failing model aborts the run under
//! [`FailurePolicy::FailFast`]; under [`FailurePolicy::Continue`] it is
//! recorded and the build carries on, but the run still ends `Failed`.

use std::collections::HashSet;
use std::fmt;
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;

use super::graph::{BuildGraph, ExecutionPlan, GraphError};
use super::{BuildContext, Model};
use crate::config::FailurePolicy;
use crate::schema::{self, tables, Layer, SchemaError};
use crate::store::{StoreError, Warehouse};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that end a build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Invalid build graph: {0}")]
    Graph(#[from] GraphError),

    #[error("Stage {stage} failed building {table}: {message}")]
    StageSql {
        stage: Layer,
        table: String,
        message: String,
    },

    #[error("Build finished with failed models: {}", failed.join(", "))]
    Incomplete { failed: Vec<String> },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type BuildResult<T> = Result<T, BuildError>;

// ============================================================================
// Run State
// ============================================================================

/// Progress of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    SchemaReady,
    DimensionsBuilt,
    FactsBuilt,
    MartsBuilt,
    AnalyticsBuilt,
    Done,
    Failed,
}

impl RunState {
    fn after(layer: Layer) -> Self {
        match layer {
            Layer::Staging => RunState::SchemaReady,
            Layer::Dimension => RunState::DimensionsBuilt,
            Layer::Fact => RunState::FactsBuilt,
            Layer::Mart => RunState::MartsBuilt,
            Layer::Analytics => RunState::AnalyticsBuilt,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Idle => "idle",
            RunState::SchemaReady => "schema ready",
            RunState::DimensionsBuilt => "dimensions built",
            RunState::FactsBuilt => "facts built",
            RunState::MartsBuilt => "marts built",
            RunState::AnalyticsBuilt => "analytics built",
            RunState::Done => "done",
            RunState::Failed => "failed",
        };
        f.pad(s)
    }
}

// ============================================================================
// Report
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ModelStatus {
    Built,
    Failed(String),
    /// Not attempted because an earlier model failed under fail-fast.
    Skipped,
}

/// What happened to one model.
#[derive(Debug, Clone)]
pub struct ModelOutcome {
    pub model: &'static str,
    pub layer: Layer,
    pub status: ModelStatus,
    /// Rows inserted, when built.
    pub rows: Option<u64>,
    pub elapsed: Duration,
}

/// Summary of a finished build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub as_of: NaiveDateTime,
    pub policy: FailurePolicy,
    pub state: RunState,
    pub outcomes: Vec<ModelOutcome>,
    /// Row count of every declared table after the build.
    pub row_counts: Vec<(&'static str, u64)>,
}

impl BuildReport {
    pub fn succeeded(&self) -> bool {
        self.state == RunState::Done
    }

    pub fn outcome(&self, model: &str) -> Option<&ModelOutcome> {
        self.outcomes.iter().find(|o| o.model == model)
    }

    pub fn failed_models(&self) -> Vec<&'static str> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, ModelStatus::Failed(_)))
            .map(|o| o.model)
            .collect()
    }

    pub fn row_count(&self, table: &str) -> Option<u64> {
        self.row_counts
            .iter()
            .find(|(name, _)| *name == table)
            .map(|(_, n)| *n)
    }

    /// Turn a failed report into an error.
    ///
    /// Fail-fast runs report the model that stopped the build; continued
    /// runs report every failed model.
    pub fn into_result(self) -> BuildResult<BuildReport> {
        if self.succeeded() {
            return Ok(self);
        }

        match self.policy {
            FailurePolicy::FailFast => {
                let first = self.outcomes.iter().find_map(|o| match &o.status {
                    ModelStatus::Failed(message) => Some(BuildError::StageSql {
                        stage: o.layer,
                        table: o.model.to_string(),
                        message: message.clone(),
                    }),
                    _ => None,
                });
                Err(first.unwrap_or(BuildError::Incomplete { failed: Vec::new() }))
            }
            FailurePolicy::Continue => Err(BuildError::Incomplete {
                failed: self.failed_models().into_iter().map(String::from).collect(),
            }),
        }
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Sequences the warehouse build over one warehouse connection.
#[derive(Debug)]
pub struct Orchestrator {
    graph: BuildGraph,
    ctx: BuildContext,
}

impl Orchestrator {
    /// Orchestrator over the standard model set.
    pub fn new(ctx: BuildContext) -> BuildResult<Self> {
        Ok(Self::with_graph(BuildGraph::standard()?, ctx))
    }

    pub fn with_graph(graph: BuildGraph, ctx: BuildContext) -> Self {
        Self { graph, ctx }
    }

    pub fn context(&self) -> &BuildContext {
        &self.ctx
    }

    pub fn graph(&self) -> &BuildGraph {
        &self.graph
    }

    pub fn plan(&self) -> ExecutionPlan {
        self.graph.plan()
    }

    /// Apply the schema and build every model.
    ///
    /// Returns `Err` only for fatal errors (schema, store). Model failures
    /// are recorded in the report; use [`BuildReport::into_result`] to
    /// treat them as errors.
    pub fn run(&self, warehouse: &mut Warehouse) -> BuildResult<BuildReport> {
        let plan = self.plan();
        let mut state = RunState::Idle;
        tracing::info!(
            as_of = %self.ctx.as_of_sql(),
            policy = self.ctx.failure_policy.as_str(),
            models = plan.len(),
            warehouse = %warehouse.location(),
            "Starting warehouse build"
        );

        if let Err(e) = schema::apply(warehouse) {
            tracing::error!(error = %e, "Schema application failed");
            return Err(e.into());
        }
        state = advance(state, RunState::SchemaReady);

        let mut outcomes = Vec::with_capacity(plan.len());
        let mut failed: HashSet<&'static str> = HashSet::new();
        let mut halted = false;

        for layer in Layer::DERIVED {
            tracing::info!(stage = %layer, "Building {}", layer);

            for model in plan.stage(layer) {
                if halted {
                    outcomes.push(skipped(model));
                    continue;
                }

                self.warn_stale_upstream(model, &failed);
                let outcome = self.build_model(model, warehouse);
                if matches!(outcome.status, ModelStatus::Failed(_)) {
                    failed.insert(model.name());
                    halted = self.ctx.failure_policy == FailurePolicy::FailFast;
                }
                outcomes.push(outcome);
            }

            if failed.is_empty() {
                state = advance(state, RunState::after(layer));
            }
        }

        state = if failed.is_empty() {
            advance(state, RunState::Done)
        } else {
            advance(state, RunState::Failed)
        };

        let row_counts = log_row_counts(warehouse)?;

        let report = BuildReport {
            as_of: self.ctx.as_of,
            policy: self.ctx.failure_policy,
            state,
            outcomes,
            row_counts,
        };

        if report.succeeded() {
            tracing::info!(models = report.outcomes.len(), "Warehouse build completed");
        } else {
            tracing::error!(
                failed = %report.failed_models().join(", "),
                "Warehouse build failed"
            );
        }
        Ok(report)
    }

    fn build_model(&self, model: &'static Model, warehouse: &mut Warehouse) -> ModelOutcome {
        let started = Instant::now();
        let result = model.build(warehouse, &self.ctx);
        let elapsed = started.elapsed();

        match result {
            Ok(rows) => {
                tracing::info!(
                    model = model.name(),
                    rows,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Built {}",
                    model.description
                );
                ModelOutcome {
                    model: model.name(),
                    layer: model.layer(),
                    status: ModelStatus::Built,
                    rows: Some(rows),
                    elapsed,
                }
            }
            Err(e) => {
                tracing::error!(
                    model = model.name(),
                    stage = %model.layer(),
                    error = %e,
                    "Model failed; table keeps its previous contents"
                );
                ModelOutcome {
                    model: model.name(),
                    layer: model.layer(),
                    status: ModelStatus::Failed(e.to_string()),
                    rows: None,
                    elapsed,
                }
            }
        }
    }

    fn warn_stale_upstream(&self, model: &Model, failed: &HashSet<&'static str>) {
        if failed.is_empty() {
            return;
        }
        let mut stale: Vec<&str> = self
            .graph
            .upstream(model.name())
            .into_iter()
            .filter(|name| failed.contains(name))
            .collect();
        if !stale.is_empty() {
            stale.sort_unstable();
            tracing::warn!(
                model = model.name(),
                stale_upstream = %stale.join(", "),
                "Building on stale upstream tables"
            );
        }
    }
}

fn skipped(model: &'static Model) -> ModelOutcome {
    ModelOutcome {
        model: model.name(),
        layer: model.layer(),
        status: ModelStatus::Skipped,
        rows: None,
        elapsed: Duration::ZERO,
    }
}

fn advance(from: RunState, to: RunState) -> RunState {
    tracing::debug!(from = %from, to = %to, "Build state");
    to
}

fn log_row_counts(warehouse: &Warehouse) -> BuildResult<Vec<(&'static str, u64)>> {
    let mut counts = Vec::with_capacity(tables::ALL.len());
    for table in tables::ALL {
        let rows = warehouse.row_count(table.name)?;
        tracing::info!(table = table.name, rows, "Row count");
        counts.push((table.name, rows));
    }
    Ok(counts)
}
