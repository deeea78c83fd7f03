//! TOML-based configuration for Revanta.
//!
//! Supports a config file (revanta.toml) with environment variable expansion
//! in path values.
//!
//! Example configuration:
//! ```toml
//! [paths]
//! raw_data_dir = "${REVANTA_HOME}/data/raw"
//! database = "database/revanta.db"
//! export_dir = "bi_exports"
//! log_dir = "etl/logs"
//!
//! [warehouse]
//! recency_window_days = 90
//! counted_statuses = ["delivered", "shipped", "approved"]
//! failure_policy = "fail_fast"   # or "continue"
//!
//! [export]
//! format = "xlsx"                # or "csv"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// File-system locations.
    pub paths: PathSettings,

    /// Warehouse build configuration.
    pub warehouse: WarehouseSettings,

    /// BI export configuration.
    pub export: ExportSettings,
}

/// File-system locations. Values support `${VAR}` expansion.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathSettings {
    /// Directory holding the raw olist CSV files.
    pub raw_data_dir: String,

    /// SQLite database file.
    pub database: String,

    /// Directory receiving exported tables.
    pub export_dir: String,

    /// Directory receiving per-run log files. Empty disables file logging.
    pub log_dir: String,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            raw_data_dir: "data/raw".to_string(),
            database: "database/revanta.db".to_string(),
            export_dir: "bi_exports".to_string(),
            log_dir: "etl/logs".to_string(),
        }
    }
}

impl PathSettings {
    pub fn raw_data_dir(&self) -> Result<PathBuf, SettingsError> {
        expand_path(&self.raw_data_dir)
    }

    pub fn database(&self) -> Result<PathBuf, SettingsError> {
        expand_path(&self.database)
    }

    pub fn export_dir(&self) -> Result<PathBuf, SettingsError> {
        expand_path(&self.export_dir)
    }

    /// Resolved log directory, or `None` when file logging is disabled.
    pub fn log_dir(&self) -> Result<Option<PathBuf>, SettingsError> {
        if self.log_dir.trim().is_empty() {
            return Ok(None);
        }
        expand_path(&self.log_dir).map(Some)
    }
}

/// What the orchestrator does when a model fails to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first failing model.
    #[default]
    FailFast,
    /// Log the failure, keep the table's previous contents and build the rest.
    Continue,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::FailFast => "fail_fast",
            FailurePolicy::Continue => "continue",
        }
    }
}

/// Warehouse build configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WarehouseSettings {
    /// A customer is active when their last counted order falls within this
    /// many days of the run's reference time.
    pub recency_window_days: u32,

    /// Order statuses that count as sales.
    pub counted_statuses: Vec<String>,

    /// Stage-level failure handling.
    pub failure_policy: FailurePolicy,
}

impl Default for WarehouseSettings {
    fn default() -> Self {
        Self {
            recency_window_days: 90,
            counted_statuses: vec![
                "delivered".to_string(),
                "shipped".to_string(),
                "approved".to_string(),
            ],
            failure_policy: FailurePolicy::FailFast,
        }
    }
}

/// Output file format for exports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }
}

/// BI export configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExportSettings {
    pub format: ExportFormat,

    /// Tables written by `export`, in order.
    pub tables: Vec<String>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            format: ExportFormat::Xlsx,
            tables: vec![
                "analytics_customer_rfm".to_string(),
                "analytics_customer_risk_scoring".to_string(),
                "analytics_monthly_revenue".to_string(),
                "analytics_product_performance".to_string(),
                "fct_sales".to_string(),
            ],
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `REVANTA_CONFIG`
    /// 2. `./revanta.toml`
    /// 3. `~/.config/revanta/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("REVANTA_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("revanta.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("revanta").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Reject values the warehouse cannot build with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.warehouse.counted_statuses.is_empty() {
            return Err(SettingsError::InvalidConfig(
                "warehouse.counted_statuses must not be empty".to_string(),
            ));
        }
        if self.export.tables.iter().any(|t| t.trim().is_empty()) {
            return Err(SettingsError::InvalidConfig(
                "export.tables contains an empty table name".to_string(),
            ));
        }
        Ok(())
    }
}

fn expand_path(s: &str) -> Result<PathBuf, SettingsError> {
    expand_env_vars(s).map(PathBuf::from)
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            // $VAR ends at the first non-alphanumeric/underscore
            while let Some(&ch) = chars.peek() {
                if ch.is_alphanumeric() || ch == '_' {
                    var_name.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            if var_name.is_empty() {
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
