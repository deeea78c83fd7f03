//! # Revanta
//!
//! A batch analytics pipeline that turns e-commerce CSV exports into a
//! dimensional SQLite warehouse.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  Raw CSV files (olist)                   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [etl: extract, transform, load]
//! ┌─────────────────────────────────────────────────────────┐
//! │                  Staging tables (stg_*)                  │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [warehouse: graph + orchestrator]
//! ┌─────────────────────────────────────────────────────────┐
//! │     dimensions → facts → marts → analytics (SQLite)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [etl: export]
//! ┌─────────────────────────────────────────────────────────┐
//! │                 XLSX / CSV files for BI                  │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod dataset;
pub mod etl;
pub mod logging;
pub mod pipeline;
pub mod schema;
pub mod store;
pub mod warehouse;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::{FailurePolicy, Settings};
    pub use crate::dataset::Dataset;
    pub use crate::pipeline::{run_pipeline, PipelineError, PipelineResult};
    pub use crate::schema::Layer;
    pub use crate::store::{Value, Warehouse};
    pub use crate::warehouse::{BuildContext, BuildGraph, BuildReport, Orchestrator};
}
