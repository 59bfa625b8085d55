//! Import service implementation.
//!
//! Orchestrates format parsing, field inference, path resolution and writes.

pub mod import;

pub use import::{
    ImportFailure, ImportOptions, ImportProgress, ImportResult, ImportService, ProgressCallback,
    RunState,
};
