//! SQLite-backed warehouse store.
//!
//! One [`Warehouse`] owns the single exclusive connection used for a whole
//! run. It is passed explicitly to every stage; nothing holds a global
//! connection.
//!
//! # Layout
//!
//! ```text
//! stg_*        staging tables, replaced by the load step
//! dim_*        dimensions
//! fct_*        facts
//! mart_*       marts
//! analytics_*  reporting tables
//! ```

mod value;
pub use value::{Value, TIMESTAMP_FORMAT};

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};

use crate::dataset::Dataset;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Table not found: {0}")]
    MissingTable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Handle to the warehouse database.
pub struct Warehouse {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Warehouse {
    /// Open or create the warehouse database file, creating parent
    /// directories as needed.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        tracing::info!(path = %path.display(), "Connected to warehouse");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory warehouse (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn, path: None })
    }

    /// Human-readable location, `:memory:` for in-memory stores.
    pub fn location(&self) -> String {
        match &self.path {
            Some(p) => p.display().to_string(),
            None => ":memory:".to_string(),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Run a multi-statement script inside one transaction.
    ///
    /// Either every statement commits or none does.
    pub fn execute_script(&mut self, sql: &str) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.commit()?;
        Ok(())
    }

    /// Check whether a table exists.
    pub fn table_exists(&self, table: &str) -> StoreResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?",
                params![table],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn require_table(&self, table: &str) -> StoreResult<()> {
        if self.table_exists(table)? {
            Ok(())
        } else {
            Err(StoreError::MissingTable(table.to_string()))
        }
    }

    /// Number of rows in a table.
    pub fn row_count(&self, table: &str) -> StoreResult<u64> {
        self.require_table(table)?;
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Read a whole table, rows in rowid order.
    pub fn read_table(&self, table: &str) -> StoreResult<Dataset> {
        self.require_table(table)?;
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {} ORDER BY rowid", quote_ident(table)))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Dataset::new(table, columns, rows))
    }
}

/// Quote an identifier for interpolation into SQL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
