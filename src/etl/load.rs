//! Load cleaned datasets into staging tables.
//!
//! A load replaces the table: it is dropped, recreated from the dataset's
//! columns and filled in one transaction. Column affinity is inferred
//! from the data.

use rusqlite::params_from_iter;

use super::SourceEntity;
use crate::dataset::Dataset;
use crate::store::{quote_ident, Warehouse};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to load {table}: {source}")]
    Sqlite {
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Dataset for {0} has no columns")]
    NoColumns(String),
}

pub type LoadResult<T> = Result<T, LoadError>;

/// Affinity of one column: INTEGER when every value is an integer, REAL when
/// every value is numeric, otherwise TEXT. All-NULL columns are TEXT.
pub fn infer_affinity(data: &Dataset, column: usize) -> &'static str {
    let mut affinity: Option<&'static str> = None;
    for value in data.rows.iter().filter_map(|row| row.get(column)) {
        affinity = match (affinity, value.affinity()) {
            (current, None) => current,
            (None, seen) => seen,
            (Some("TEXT"), _) | (_, Some("TEXT")) => Some("TEXT"),
            (Some(a), Some(b)) if a == b => Some(a),
            _ => Some("REAL"),
        };
    }
    affinity.unwrap_or("TEXT")
}

fn create_sql(table: &str, data: &Dataset) -> String {
    let columns: Vec<String> = data
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{} {}", quote_ident(name), infer_affinity(data, i)))
        .collect();
    format!("CREATE TABLE {} ({})", quote_ident(table), columns.join(", "))
}

/// Replace `table` with the contents of `data`. Returns the rows written.
pub fn load(warehouse: &mut Warehouse, table: &str, data: &Dataset) -> LoadResult<u64> {
    if data.columns.is_empty() {
        return Err(LoadError::NoColumns(table.to_string()));
    }
    let sql_err = |source| LoadError::Sqlite {
        table: table.to_string(),
        source,
    };

    let placeholders = vec!["?"; data.width()].join(", ");
    let insert = format!("INSERT INTO {} VALUES ({})", quote_ident(table), placeholders);

    let tx = warehouse.connection_mut().transaction().map_err(sql_err)?;
    tx.execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)), [])
        .map_err(sql_err)?;
    tx.execute(&create_sql(table, data), []).map_err(sql_err)?;
    {
        let mut stmt = tx.prepare(&insert).map_err(sql_err)?;
        for row in &data.rows {
            stmt.execute(params_from_iter(row.iter())).map_err(sql_err)?;
        }
    }
    tx.commit().map_err(sql_err)?;

    tracing::info!(table, rows = data.len(), "Loaded staging table");
    Ok(data.len() as u64)
}

/// Load every cleaned dataset into its staging table.
pub fn load_all(
    warehouse: &mut Warehouse,
    datasets: &[(SourceEntity, Dataset)],
) -> LoadResult<Vec<(&'static str, u64)>> {
    datasets
        .iter()
        .map(|(entity, data)| {
            let table = entity.staging_table().name;
            Ok((table, load(warehouse, table, data)?))
        })
        .collect()
}
