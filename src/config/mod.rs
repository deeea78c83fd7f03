//! Configuration module for Revanta.
//!
//! Handles the TOML settings file and environment variable expansion.

mod settings;

pub use settings::{
    expand_env_vars, ExportFormat, ExportSettings, FailurePolicy, PathSettings, Settings,
    SettingsError, WarehouseSettings,
};
