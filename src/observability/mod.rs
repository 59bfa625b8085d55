//! Observability: log subscriber setup.
//!
//! The library only emits `tracing` events; the binary calls [`init`] once
//! to decide where they go.

mod logging;

pub use logging::{LOG_ENV, LogFormat, LoggingConfig};

use crate::config::LoggingSettings;
use crate::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry, fmt};

/// Options for initialization.
#[derive(Debug, Clone, Copy)]
pub struct InitOptions {
    /// Whether verbose output was requested via CLI.
    pub verbose: bool,
}

static OBSERVABILITY_INIT: OnceLock<()> = OnceLock::new();

/// Initializes logging from config settings with env overrides.
///
/// # Errors
///
/// Returns an error if logging has already been initialized or the log file
/// cannot be opened.
pub fn init_from_settings(settings: &LoggingSettings, options: InitOptions) -> Result<()> {
    init(LoggingConfig::from_settings(Some(settings), options.verbose))
}

/// Installs the global log subscriber.
///
/// # Errors
///
/// Returns an error if logging has already been initialized or the log file
/// cannot be opened.
pub fn init(config: LoggingConfig) -> Result<()> {
    if OBSERVABILITY_INIT.get().is_some() {
        return Err(Error::OperationFailed {
            operation: "observability_init".to_string(),
            cause: "observability already initialized".to_string(),
        });
    }

    let to_file = config.file.is_some();
    let writer = match &config.file {
        Some(path) => BoxMakeWriter::new(Mutex::new(open_log_file(path)?)),
        None => BoxMakeWriter::new(io::stderr),
    };
    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_current_span(true)
            .with_span_list(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_writer(writer)
            .with_ansi(!to_file)
            .with_target(to_file)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(config.filter)
        .try_init()
        .map_err(init_error)?;

    OBSERVABILITY_INIT
        .set(())
        .map_err(|()| Error::OperationFailed {
            operation: "observability_init".to_string(),
            cause: "failed to mark observability initialized".to_string(),
        })?;

    Ok(())
}

/// Opens a log file for appending.
fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
            operation: "create_log_dir".to_string(),
            cause: e.to_string(),
        })?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::OperationFailed {
            operation: "open_log_file".to_string(),
            cause: format!("{}: {}", path.display(), e),
        })
}

#[allow(clippy::needless_pass_by_value)]
fn init_error(e: tracing_subscriber::util::TryInitError) -> Error {
    Error::OperationFailed {
        operation: "observability_init".to_string(),
        cause: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_log_file_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/nested/import.log");
        open_log_file(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_open_log_file_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_log_file(dir.path()).unwrap_err();
        assert!(err.to_string().contains(&dir.path().display().to_string()));
    }
}
