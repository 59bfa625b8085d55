//! Import runner.
//!
//! Drives one export file through parsing, inference, path resolution and
//! writing. Every record is parsed and placed before the first write, since
//! a late merged record may move an earlier entry.

use crate::config::ImportConfig;
use crate::io::formats::{Format, create_import_source};
use crate::io::inference::FieldInference;
use crate::io::paths::{PathBuilder, PathRegistry, Registration};
use crate::io::traits::ImportSource;
use crate::models::RawRecord;
use crate::store::{Payload, Preview, SecretSink, StoreWriter, WriteOutcome};
use crate::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::instrument;

/// Options for one import run.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Format to read; detected from the file when unset.
    pub format: Option<Format>,
}

impl ImportOptions {
    /// Forces a format instead of detecting it.
    #[must_use]
    pub const fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }
}

/// Phases of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// Nothing started.
    #[default]
    Idle,
    /// Reading records from the source.
    Parsing,
    /// Mapping records onto canonical fields.
    Inferring,
    /// Naming entries and settling collisions.
    PathResolving,
    /// Handing entries to the store.
    Writing,
    /// Summarizing.
    Reporting,
    /// Finished.
    Done,
}

/// Progress callback for import operations.
pub type ProgressCallback = Box<dyn Fn(&ImportProgress) + Send>;

/// Running counts, reported after every record and every write.
#[derive(Debug, Clone, Default)]
pub struct ImportProgress {
    /// Current phase.
    pub state: RunState,
    /// Records read so far, including malformed ones.
    pub attempted: usize,
    /// Entries written or previewed.
    pub succeeded: usize,
    /// Records or entries that failed.
    pub failed: usize,
    /// Entries dropped as duplicates.
    pub skipped_duplicates: usize,
    /// Estimated number of records, if the source knows.
    pub total_estimate: Option<usize>,
}

/// One record or entry that could not be imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFailure {
    /// Store path, or `record N` if the failure came before naming.
    pub path: String,
    /// What went wrong.
    pub reason: String,
}

impl ImportFailure {
    fn from_error(label: String, error: Error) -> Self {
        match error {
            Error::Write { path, reason } => Self { path, reason },
            Error::Parse { record, message } => Self {
                path: record,
                reason: message,
            },
            other => Self {
                path: label,
                reason: other.to_string(),
            },
        }
    }
}

/// Result of an import run.
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    /// Records read from the source, including malformed ones.
    pub attempted: usize,
    /// Entries written, or previewed in a dry run.
    pub succeeded: usize,
    /// Entries dropped because an identical one was already placed.
    pub skipped_duplicates: usize,
    /// Failures in the order they happened.
    pub failed: Vec<ImportFailure>,
    /// Paths of the entries counted in `succeeded`, in write order.
    pub paths: Vec<String>,
    /// Dry-run previews, in write order.
    pub previews: Vec<Preview>,
}

impl ImportResult {
    /// Creates an empty result.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            attempted: 0,
            succeeded: 0,
            skipped_duplicates: 0,
            failed: Vec::new(),
            paths: Vec::new(),
            previews: Vec::new(),
        }
    }

    /// Returns whether any record or entry failed.
    #[must_use]
    pub const fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Service for importing an export file into the store.
pub struct ImportService<S: SecretSink> {
    metadata: bool,
    inference: FieldInference,
    paths: PathBuilder,
    writer: StoreWriter<S>,
}

impl<S: SecretSink> ImportService<S> {
    /// Creates a service writing to `sink`.
    #[must_use]
    pub fn new(config: &ImportConfig, sink: S) -> Self {
        Self {
            metadata: config.features.metadata,
            inference: FieldInference::from_features(&config.features),
            paths: PathBuilder::from_config(config),
            writer: StoreWriter::new(sink, config),
        }
    }

    /// Returns the sink.
    #[must_use]
    pub const fn sink(&self) -> &S {
        self.writer.sink()
    }

    /// Consumes the service, returning the sink.
    #[must_use]
    pub fn into_sink(self) -> S {
        self.writer.into_sink()
    }

    /// Imports an export file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or its format is not
    /// supported. Per-record failures are reported in the result instead.
    #[instrument(skip(self, path, options, progress), fields(path = %path.display()))]
    pub fn import_from_file(
        &mut self,
        path: &Path,
        options: &ImportOptions,
        progress: Option<ProgressCallback>,
    ) -> Result<ImportResult> {
        let format = match options.format {
            Some(format) => format,
            None => Format::detect(path)?,
        };
        tracing::debug!(%format, "Using format");

        let file = File::open(path).map_err(|e| Error::Io {
            context: path.display().to_string(),
            source: e,
        })?;

        self.import_from_reader(BufReader::new(file), format, progress)
    }

    /// Imports from a reader in the given format.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be set up or fails mid-read.
    pub fn import_from_reader<R: BufRead + 'static>(
        &mut self,
        reader: R,
        format: Format,
        progress: Option<ProgressCallback>,
    ) -> Result<ImportResult> {
        let mut source = create_import_source(reader, format)?;
        self.import_from_source(source.as_mut(), format, progress)
    }

    /// Imports from a source.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error raised by the source. Nothing has been
    /// written at that point.
    pub fn import_from_source(
        &mut self,
        source: &mut dyn ImportSource,
        format: Format,
        progress: Option<ProgressCallback>,
    ) -> Result<ImportResult> {
        let mut result = ImportResult::new();
        let mut prog = ImportProgress {
            total_estimate: source.size_hint(),
            ..ImportProgress::default()
        };
        let report = |prog: &ImportProgress| {
            if let Some(cb) = &progress {
                cb(prog);
            }
        };

        enter(&mut prog, RunState::Parsing);
        let mut records: Vec<RawRecord> = Vec::new();
        loop {
            match source.next() {
                Ok(Some(record)) => records.push(record),
                Ok(None) => break,
                Err(e) if e.is_record_level() => {
                    tracing::warn!(error = %e, "Skipping malformed record");
                    prog.failed += 1;
                    let label = format!("record {}", prog.attempted + 1);
                    result.failed.push(ImportFailure::from_error(label, e));
                },
                Err(e) => return Err(e),
            }
            prog.attempted += 1;
            report(&prog);
        }
        result.attempted = prog.attempted;

        enter(&mut prog, RunState::Inferring);
        let inferred: Vec<_> = records.iter().map(|r| self.inference.infer(r)).collect();

        enter(&mut prog, RunState::PathResolving);
        let mut registry = PathRegistry::new();
        for entry in inferred {
            let label = entry.label();
            let built = match self.paths.build(entry, format.encodes_merge_history()) {
                Ok(built) => built,
                Err(e) => {
                    prog.failed += 1;
                    result.failed.push(ImportFailure::from_error(label, e));
                    continue;
                },
            };
            let payload = Payload::render(&built.entry, self.metadata);
            if let Registration::Duplicate { path } =
                registry.register(built.entry, payload, built.merged)
            {
                tracing::info!(%path, "Skipping duplicate entry");
                prog.skipped_duplicates += 1;
            }
        }
        result.skipped_duplicates = prog.skipped_duplicates;

        enter(&mut prog, RunState::Writing);
        for (entry, payload) in registry.into_entries() {
            match self.writer.write(&entry.path, &payload) {
                Ok(outcome) => {
                    if let WriteOutcome::Previewed(preview) = outcome {
                        result.previews.push(preview);
                    }
                    prog.succeeded += 1;
                    result.paths.push(entry.path);
                },
                Err(e) => {
                    prog.failed += 1;
                    result.failed.push(ImportFailure::from_error(entry.path, e));
                },
            }
            report(&prog);
        }
        result.succeeded = prog.succeeded;

        enter(&mut prog, RunState::Reporting);
        tracing::info!(
            attempted = result.attempted,
            succeeded = result.succeeded,
            failed = result.failed.len(),
            skipped_duplicates = result.skipped_duplicates,
            "Import finished"
        );
        enter(&mut prog, RunState::Done);
        report(&prog);

        Ok(result)
    }
}

fn enter(progress: &mut ImportProgress, state: RunState) {
    tracing::debug!(from = ?progress.state, to = ?state, "Import state");
    progress.state = state;
}
