//! Read raw CSV files into datasets.
//!
//! Extraction does no cleaning: every column is kept under its original
//! header, every cell is text, and empty cells become NULL.

use std::path::{Path, PathBuf};

use csv::ReaderBuilder;

use super::SourceEntity;
use crate::dataset::Dataset;
use crate::store::Value;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Source file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

pub type ExtractResult<T> = Result<T, ExtractError>;

/// Read one source file from `raw_dir`.
pub fn extract(entity: SourceEntity, raw_dir: &Path) -> ExtractResult<Dataset> {
    let path = raw_dir.join(entity.file_name());
    let data = read_csv(&path, entity.as_str())?;
    tracing::info!(
        entity = entity.as_str(),
        rows = data.len(),
        columns = data.width(),
        "Extracted {}",
        entity.file_name()
    );
    Ok(data)
}

/// Read every source file, in [`SourceEntity::ALL`] order.
pub fn extract_all(raw_dir: &Path) -> ExtractResult<Vec<(SourceEntity, Dataset)>> {
    SourceEntity::ALL
        .iter()
        .map(|&entity| Ok((entity, extract(entity, raw_dir)?)))
        .collect()
}

/// Read a headed CSV file. Short records are padded with NULL and long
/// ones truncated to the header width.
pub fn read_csv(path: &Path, name: &str) -> ExtractResult<Dataset> {
    if !path.is_file() {
        return Err(ExtractError::MissingFile(path.to_path_buf()));
    }
    let csv_err = |source| ExtractError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let columns: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|s| s.to_string())
        .collect();
    let width = columns.len();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        let mut row: Vec<Value> = record.iter().take(width).map(Value::text).collect();
        row.resize(width, Value::Null);
        rows.push(row);
    }

    Ok(Dataset::new(name, columns, rows))
}
