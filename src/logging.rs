//! Tracing setup for the `revanta` binary.
//!
//! Events go to stderr and, when a log directory is configured, to a
//! per-run file `pipeline_YYYYMMDD_HHMMSS.log`. `RUST_LOG` overrides the
//! default filter.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "revanta=info";
const VERBOSE_LOG_FILTER: &str = "revanta=debug";

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to create log file {}: {source}", path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to install tracing subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

pub struct LogConfig<'a> {
    pub verbose: bool,
    /// Directory for the per-run log file; `None` logs to stderr only.
    pub log_dir: Option<&'a Path>,
}

/// Name of the log file for a run started at `started`.
pub fn log_file_name(started: chrono::NaiveDateTime) -> String {
    format!("pipeline_{}.log", started.format("%Y%m%d_%H%M%S"))
}

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            VERBOSE_LOG_FILTER
        } else {
            DEFAULT_LOG_FILTER
        })
    })
}

/// Install the global subscriber. Returns the log file path, if any.
pub fn init_logging(config: LogConfig<'_>) -> Result<Option<PathBuf>, LoggingError> {
    let log_file = match config.log_dir {
        Some(dir) => {
            let path = dir.join(log_file_name(chrono::Local::now().naive_local()));
            let file = fs::create_dir_all(dir)
                .and_then(|_| File::create(&path))
                .map_err(|source| LoggingError::LogFile {
                    path: path.clone(),
                    source,
                })?;
            Some((path, file))
        }
        None => None,
    };

    let (path, file_layer) = match log_file {
        Some((path, file)) => (
            Some(path),
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_filter(filter(config.verbose)),
            ),
        ),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter(config.verbose)),
        )
        .try_init()?;

    Ok(path)
}
