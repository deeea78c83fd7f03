//! SQL transformation layer: staging → dimensions → facts → marts → analytics.
//!
//! Each derived table is produced by exactly one [`Model`]: a parameterised
//! `INSERT ... SELECT` run after emptying the target, inside a single
//! transaction. Models declare the tables they read; the [`graph`] module
//! validates those declarations and orders the build, and the
//! [`orchestrator`] runs it.
//!
//! ```text
//! stg_*  ──▶  dim_customers ─┬─▶ fct_sales ───────▶ mart_monthly_sales ─▶ analytics_monthly_revenue
//!             dim_date ──────┘
//!             dim_products ─────▶ fct_order_items ─▶ mart_product_sales
//!                                                 └─▶ analytics_product_performance
//!             dim_customers ────────────────────────▶ analytics_customer_rfm
//!                                                  └─▶ analytics_customer_risk_scoring
//! ```

pub mod analytics;
pub mod dimensions;
pub mod facts;
pub mod graph;
pub mod marts;
pub mod orchestrator;

pub use graph::{BuildGraph, ExecutionPlan, GraphError};
pub use orchestrator::{
    BuildError, BuildReport, BuildResult, ModelOutcome, ModelStatus, Orchestrator, RunState,
};

use chrono::{NaiveDateTime, Utc};
use rusqlite::ToSql;

use crate::config::{FailurePolicy, WarehouseSettings};
use crate::schema::{self, Layer, TableSchema};
use crate::store::{Warehouse, TIMESTAMP_FORMAT};

/// Run-scoped parameters shared by every model.
///
/// `as_of` is captured once per run and bound into every time-relative
/// statement as `:as_of`, so all tables of one run agree on "now".
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub as_of: NaiveDateTime,
    pub recency_window_days: u32,
    pub counted_statuses: Vec<String>,
    pub failure_policy: FailurePolicy,
}

impl BuildContext {
    /// Context with default warehouse settings.
    pub fn new(as_of: NaiveDateTime) -> Self {
        Self::from_settings(&WarehouseSettings::default(), as_of)
    }

    pub fn from_settings(settings: &WarehouseSettings, as_of: NaiveDateTime) -> Self {
        Self {
            as_of,
            recency_window_days: settings.recency_window_days,
            counted_statuses: settings.counted_statuses.clone(),
            failure_policy: settings.failure_policy,
        }
    }

    /// Capture the UTC clock once for this run, matching SQLite's `'now'`.
    pub fn now(settings: &WarehouseSettings) -> Self {
        Self::from_settings(settings, Utc::now().naive_utc())
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn as_of_sql(&self) -> String {
        self.as_of.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Named statement parameters, bound when a statement references them.
    fn parameters(&self) -> Vec<(&'static str, rusqlite::types::Value)> {
        let statuses = serde_json::Value::from(self.counted_statuses.clone()).to_string();
        vec![
            (":as_of", rusqlite::types::Value::Text(self.as_of_sql())),
            (
                ":recency_window_days",
                rusqlite::types::Value::Integer(i64::from(self.recency_window_days)),
            ),
            (":counted_statuses", rusqlite::types::Value::Text(statuses)),
        ]
    }
}

/// One derived table and the statement that fills it.
#[derive(Debug)]
pub struct Model {
    pub target: &'static TableSchema,
    /// Tables read by `insert_sql`.
    pub depends_on: &'static [&'static str],
    pub description: &'static str,
    pub insert_sql: &'static str,
}

impl Model {
    pub fn name(&self) -> &'static str {
        self.target.name
    }

    pub fn layer(&self) -> Layer {
        self.target.layer
    }

    /// Replace the target's contents. Returns the number of rows inserted.
    ///
    /// Delete and insert share one transaction: on error the table keeps
    /// whatever it held before.
    pub fn build(&self, warehouse: &mut Warehouse, ctx: &BuildContext) -> rusqlite::Result<u64> {
        let tx = warehouse.connection_mut().transaction()?;
        tx.execute(&schema::clear_table_sql(self.target), [])?;

        let inserted = {
            let mut stmt = tx.prepare(self.insert_sql)?;
            let values = ctx.parameters();
            let mut bound: Vec<(&str, &dyn ToSql)> = Vec::with_capacity(values.len());
            for (name, value) in &values {
                if stmt.parameter_index(name)?.is_some() {
                    bound.push((*name, value as &dyn ToSql));
                }
            }
            stmt.execute(bound.as_slice())?
        };

        tx.commit()?;
        Ok(inserted as u64)
    }
}

/// Every model the warehouse builds, in declaration order.
pub fn all_models() -> Vec<&'static Model> {
    dimensions::MODELS
        .iter()
        .chain(facts::MODELS)
        .chain(marts::MODELS)
        .chain(analytics::MODELS)
        .copied()
        .collect()
}

/// Find a model by target table name.
pub fn find_model(name: &str) -> Option<&'static Model> {
    all_models().into_iter().find(|m| m.name() == name)
}
