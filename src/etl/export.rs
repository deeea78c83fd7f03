//! Export warehouse tables for BI tools: one file per table.

use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook};

use super::extract::{read_csv, ExtractError};
use crate::config::{ExportFormat, ExportSettings};
use crate::dataset::Dataset;
use crate::store::{StoreError, Value, Warehouse};

/// Excel worksheet limits.
const MAX_SHEET_ROWS: usize = 1_048_576;
const MAX_SHEET_NAME: usize = 31;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Table not found: {0}")]
    MissingTable(String),

    #[error("Failed to read {table}: {source}")]
    Store {
        table: String,
        #[source]
        source: StoreError,
    },

    #[error("Table {table} has {rows} rows, more than a worksheet holds")]
    TooManyRows { table: String, rows: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XLSX write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// One exported file.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub table: String,
    pub path: PathBuf,
    pub rows: usize,
    pub columns: usize,
}

/// Write `table` into `dir` as `<table>.<ext>`.
pub fn export_table(
    warehouse: &Warehouse,
    table: &str,
    dir: &Path,
    format: ExportFormat,
) -> ExportResult<ExportSummary> {
    let data = warehouse.read_table(table).map_err(|e| match e {
        StoreError::MissingTable(name) => ExportError::MissingTable(name),
        source => ExportError::Store {
            table: table.to_string(),
            source,
        },
    })?;

    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.{}", table, format.extension()));
    match format {
        ExportFormat::Xlsx => write_xlsx(&data, &path)?,
        ExportFormat::Csv => write_csv(&data, &path)?,
    }

    let summary = ExportSummary {
        table: table.to_string(),
        path,
        rows: data.len(),
        columns: data.width(),
    };
    tracing::info!(
        table,
        rows = summary.rows,
        columns = summary.columns,
        path = %summary.path.display(),
        "Exported table"
    );
    Ok(summary)
}

/// Export every configured table. Stops at the first failure.
pub fn export_all(
    warehouse: &Warehouse,
    settings: &ExportSettings,
    dir: &Path,
) -> ExportResult<Vec<ExportSummary>> {
    settings
        .tables
        .iter()
        .map(|table| export_table(warehouse, table, dir, settings.format))
        .collect()
}

/// Convert every `*.csv` file in `dir` to an XLSX file next to it.
///
/// Numeric-looking cells are written as numbers. Files are processed in
/// name order.
pub fn convert_csv_dir(dir: &Path) -> ExportResult<Vec<ExportSummary>> {
    let mut csv_files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    csv_files.sort();

    let mut summaries = Vec::with_capacity(csv_files.len());
    for csv_path in csv_files {
        let stem = csv_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut data = read_csv(&csv_path, &stem).map_err(|e| match e {
            ExtractError::MissingFile(path) => ExportError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                path.display().to_string(),
            )),
            ExtractError::Csv { source, .. } => ExportError::Csv(source),
        })?;
        for row in &mut data.rows {
            for cell in row.iter_mut() {
                let number = cell.as_str().and_then(|s| s.trim().parse::<f64>().ok());
                if let Some(n) = number.filter(|n| n.is_finite()) {
                    *cell = Value::Real(n);
                }
            }
        }

        let path = csv_path.with_extension(ExportFormat::Xlsx.extension());
        write_xlsx(&data, &path)?;
        tracing::info!(
            file = %csv_path.display(),
            rows = data.len(),
            columns = data.width(),
            "Converted to XLSX"
        );
        summaries.push(ExportSummary {
            table: stem,
            path,
            rows: data.len(),
            columns: data.width(),
        });
    }
    Ok(summaries)
}

fn write_xlsx(data: &Dataset, path: &Path) -> ExportResult<()> {
    if data.len() >= MAX_SHEET_ROWS {
        return Err(ExportError::TooManyRows {
            table: data.name.clone(),
            rows: data.len(),
        });
    }

    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    let sheet_name: String = data.name.chars().take(MAX_SHEET_NAME).collect();
    worksheet.set_name(&sheet_name)?;

    for (col, name) in data.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, &header)?;
    }

    for (r, row) in data.rows.iter().enumerate() {
        let r = (r + 1) as u32;
        for (c, value) in row.iter().enumerate() {
            let c = c as u16;
            match value {
                Value::Null => {}
                Value::Integer(i) => {
                    worksheet.write_number(r, c, *i as f64)?;
                }
                Value::Real(f) => {
                    worksheet.write_number(r, c, *f)?;
                }
                Value::Text(_) | Value::Timestamp(_) => {
                    worksheet.write_string(r, c, value.to_string())?;
                }
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

fn write_csv(data: &Dataset, path: &Path) -> ExportResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&data.columns)?;
    for row in &data.rows {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}
