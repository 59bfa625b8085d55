//! Export file import subsystem.
//!
//! Reads password manager exports and turns them into store entries.
//!
//! # Architecture
//!
//! - **Format adapters** implement [`ImportSource`] and yield raw records
//! - **Inference** maps raw keys onto the canonical entry schema
//! - **Paths** name entries and settle collisions across a run
//! - **Services** drive the pipeline and hand entries to the store
//!
//! # Supported Formats
//!
//! | Format | Detected from | Notes |
//! |--------|---------------|-------|
//! | Delimited | `.txt`, header `.csv` | Comma or tab, sniffed from the first line |
//! | 1PIF | `.1pif` | Login items only |
//! | Print list | `.html`, `.htm` | Tables without form fields are skipped |
//! | Key/value | `.csv` with `field`/`value` header | First row ignored |
//! | Gorilla | `.csv` starting with `uuid` | Honors `-merged<timestamp>` titles |
//!
//! # Example
//!
//! ```rust,ignore
//! use pass_import::io::{Format, ImportService};
//! use pass_import::{ImportConfig, MemorySink};
//! use std::io::Cursor;
//!
//! let config = ImportConfig::default();
//! let mut service = ImportService::new(&config, MemorySink::new());
//! let result = service.import_from_reader(
//!     Cursor::new("title,password\nBank,secret1\n"),
//!     Format::Delimited,
//!     None,
//! )?;
//! assert_eq!(result.paths, vec!["Bank"]);
//! ```

pub mod formats;
pub mod inference;
pub mod paths;
pub mod services;
pub mod traits;

// Re-exports for convenience
pub use formats::Format;
pub use inference::{FieldInference, InferredEntry};
pub use paths::{PathBuilder, PathRegistry, Registration};
pub use services::import::{
    ImportFailure, ImportOptions, ImportProgress, ImportResult, ImportService, ProgressCallback,
    RunState,
};
pub use traits::ImportSource;
