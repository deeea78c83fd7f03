//! Flat-file side of the pipeline.
//!
//! ```text
//! raw CSV ──extract──▶ Dataset ──transform──▶ Dataset ──load──▶ stg_* tables
//!                                        warehouse tables ──export──▶ XLSX / CSV
//! ```

pub mod export;
pub mod extract;
pub mod load;
pub mod source;
pub mod transform;

pub use export::{export_all, export_table, ExportError, ExportSummary};
pub use extract::{extract, extract_all, ExtractError};
pub use load::{load, load_all, LoadError};
pub use source::SourceEntity;
pub use transform::{transform, transform_all, TransformError};
