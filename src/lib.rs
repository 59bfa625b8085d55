//! # pass-import
//!
//! Imports password manager exports into a `pass` password store.
//!
//! Every supported export is read into raw key/value records, those records
//! are mapped onto a fixed entry schema (password, login, url, otp, notes and
//! miscellaneous attributes), given a sanitized store path, and handed to the
//! store's insertion command one entry at a time.
//!
//! ## Features
//!
//! - 1Password text exports (comma or tab delimited) and 1PIF files
//! - RoboForm HTML print lists
//! - Enpass flat key/value CSV exports
//! - Password Gorilla CSV exports, including `-merged<timestamp>` history
//! - Generic header CSV exports (KeePassX, Chrome, ...)
//! - Dry-run previews and an injectable secret sink for testing
//!
//! ## Example
//!
//! ```rust,ignore
//! use pass_import::{ImportConfig, ImportOptions, ImportService, PassCommandSink};
//!
//! let config = ImportConfig::default().with_dry_run(true);
//! let mut service = ImportService::new(&config, PassCommandSink::from_config(&config.store));
//! let result = service.import_from_file(
//!     std::path::Path::new("export.1pif"),
//!     &ImportOptions::default(),
//!     None,
//! )?;
//! println!("Imported {} of {} entries", result.succeeded, result.attempted);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod io;
pub mod models;
pub mod observability;
pub mod store;

// Re-exports for convenience
pub use config::{FeatureFlags, ImportConfig, NameField, StoreConfig};
pub use io::{Format, ImportOptions, ImportResult, ImportService};
pub use models::{CanonicalEntry, RawRecord};
pub use store::{MemorySink, PassCommandSink, Payload, SecretSink};

/// Error type for import operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When | Fatal |
/// |---------|-------------|-------|
/// | `UnsupportedFormat` | Unknown extension, undetectable delimiter | yes |
/// | `Io` | The export file cannot be opened or read | yes |
/// | `Parse` | One record is malformed or has no usable name | no |
/// | `Write` | The store command exits with a non-zero status | no |
/// | `InvalidInput` | Bad CLI or configuration values | yes |
/// | `OperationFailed` | Config file or logging setup fails | yes |
#[derive(Debug, ThisError)]
pub enum Error {
    /// The export file's format could not be recognized.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The export file could not be read.
    #[error("cannot read {context}: {source}")]
    Io {
        /// What was being read (a file path or `export file, line N`).
        context: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A single record could not be parsed or named.
    ///
    /// Raised when:
    /// - A 1PIF object is not valid JSON
    /// - A CSV row cannot be decoded
    /// - A record has neither a title nor a url to build its path from
    #[error("{record}: {message}")]
    Parse {
        /// Label of the offending record (`record N`, or its path).
        record: String,
        /// What went wrong, including line/column context when known.
        message: String,
    },

    /// The store refused an entry.
    #[error("failed to write {path}: {reason}")]
    Write {
        /// Store path of the entry.
        path: String,
        /// Captured error output or exit status of the store command.
        reason: String,
    },

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Builds a [`Error::Parse`] for the given record label.
    #[must_use]
    pub fn parse(record: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            record: record.into(),
            message: message.into(),
        }
    }

    /// Returns whether the error concerns a single record only.
    ///
    /// Record-level errors are collected into the import result and the run
    /// continues; every other error aborts the run.
    #[must_use]
    pub const fn is_record_level(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::Write { .. })
    }
}

/// Result type alias for import operations.
pub type Result<T> = std::result::Result<T, Error>;
