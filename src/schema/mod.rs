//! Warehouse schema declarations and the schema initializer.
//!
//! Every table the pipeline touches is declared once as a [`TableSchema`]
//! static and rendered to SQLite DDL. Creation is idempotent
//! (`CREATE TABLE IF NOT EXISTS`), so the initializer can run at the start of
//! every build against an existing database.
//!
//! # Examples
//!
//! ```ignore
//! use revanta::schema::{self, tables};
//!
//! println!("{}", tables::DIM_DATE.create_sql());
//! schema::apply(&mut warehouse)?;
//! ```

pub mod tables;

use std::fmt;

use crate::store::{quote_ident, StoreError, Warehouse};

/// Warehouse layer a table belongs to, in build order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Staging,
    Dimension,
    Fact,
    Mart,
    Analytics,
}

impl Layer {
    /// Derived layers, in the order the orchestrator builds them.
    pub const DERIVED: [Layer; 4] = [Layer::Dimension, Layer::Fact, Layer::Mart, Layer::Analytics];

    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Staging => "staging",
            Layer::Dimension => "dimensions",
            Layer::Fact => "facts",
            Layer::Mart => "marts",
            Layer::Analytics => "analytics",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// SQLite storage class for a declared column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Real,
    Text,
}

impl SqlType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Text => "TEXT",
        }
    }
}

/// Column definition for CREATE TABLE.
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub not_null: bool,
}

impl ColumnDef {
    pub const fn new(name: &'static str, sql_type: SqlType) -> Self {
        Self {
            name,
            sql_type,
            not_null: false,
        }
    }

    pub const fn int(name: &'static str) -> Self {
        Self::new(name, SqlType::Integer)
    }

    pub const fn real(name: &'static str) -> Self {
        Self::new(name, SqlType::Real)
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, SqlType::Text)
    }

    pub const fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    fn to_sql(self) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type.as_str());
        if self.not_null {
            sql.push_str(" NOT NULL");
        }
        sql
    }
}

/// A declared warehouse table.
#[derive(Debug)]
pub struct TableSchema {
    pub name: &'static str,
    pub layer: Layer,
    pub columns: &'static [ColumnDef],
    /// Table-level primary key. A single `INTEGER` column becomes the rowid
    /// alias and serves as the surrogate key.
    pub primary_key: &'static [&'static str],
    /// Grain constraints beyond the primary key.
    pub unique: &'static [&'static [&'static str]],
    /// Secondary indexes, one column list each.
    pub indexes: &'static [&'static [&'static str]],
}

impl TableSchema {
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for this table.
    pub fn create_sql(&self) -> String {
        let mut parts: Vec<String> = self.columns.iter().map(|c| c.to_sql()).collect();

        if !self.primary_key.is_empty() {
            parts.push(format!("PRIMARY KEY ({})", self.primary_key.join(", ")));
        }
        for cols in self.unique {
            parts.push(format!("UNIQUE ({})", cols.join(", ")));
        }

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);",
            self.name,
            parts.join(",\n    ")
        )
    }

    /// `CREATE INDEX IF NOT EXISTS` statements for this table.
    pub fn index_sql(&self) -> Vec<String> {
        self.indexes
            .iter()
            .map(|cols| {
                format!(
                    "CREATE INDEX IF NOT EXISTS idx_{}_{} ON {} ({});",
                    self.name,
                    cols.join("_"),
                    self.name,
                    cols.join(", ")
                )
            })
            .collect()
    }
}

/// Errors raised while applying the schema. Always fatal to a run.
#[derive(Debug, thiserror::Error)]
#[error("Schema application failed: {source}")]
pub struct SchemaError {
    #[from]
    pub source: StoreError,
}

impl From<rusqlite::Error> for SchemaError {
    fn from(e: rusqlite::Error) -> Self {
        Self {
            source: StoreError::Sqlite(e),
        }
    }
}

/// The full schema script: every table, then every index.
pub fn schema_sql() -> String {
    let mut statements: Vec<String> = tables::ALL.iter().map(|t| t.create_sql()).collect();
    statements.extend(tables::ALL.iter().flat_map(|t| t.index_sql()));
    statements.join("\n\n")
}

/// Apply the full schema in one transaction.
pub fn apply(warehouse: &mut Warehouse) -> Result<(), SchemaError> {
    warehouse.execute_script(&schema_sql())?;
    tracing::info!(tables = tables::ALL.len(), "Schema applied");
    Ok(())
}

/// Delete every row of `table` inside an open transaction.
pub(crate) fn clear_table_sql(table: &TableSchema) -> String {
    format!("DELETE FROM {}", quote_ident(table.name))
}
