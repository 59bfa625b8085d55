//! Core trait for reading export files.
//!
//! Defines the [`ImportSource`] trait that format adapters implement.

use crate::Result;
use crate::models::RawRecord;

/// Source of raw records.
///
/// Implementations read one export format and yield its records one at a
/// time. A source is finite and cannot be restarted.
///
/// # Errors and recovery
///
/// An [`crate::Error::Parse`] returned from [`ImportSource::next`] concerns a
/// single record: the source has already moved past it and may be polled
/// again. Any other error means the file itself is unusable and the source
/// must not be polled further.
///
/// # Example Implementation
///
/// ```rust,ignore
/// impl ImportSource for LineSource {
///     fn next(&mut self) -> Result<Option<RawRecord>> {
///         let Some(line) = self.lines.next() else {
///             return Ok(None);
///         };
///         self.index += 1;
///         Ok(Some(RawRecord::new(self.index).with_title(Some(line))))
///     }
/// }
/// ```
pub trait ImportSource {
    /// Reads the next record from the source.
    ///
    /// Returns `Ok(None)` when the source is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if a record is malformed or I/O fails.
    fn next(&mut self) -> Result<Option<RawRecord>>;

    /// Returns an estimate of the total number of records.
    ///
    /// Used for progress reporting. Returns `None` if unknown.
    fn size_hint(&self) -> Option<usize> {
        None
    }
}

/// Maps a `csv` error onto the crate taxonomy.
///
/// I/O errors are fatal; decoding errors only affect the current record.
pub(crate) fn csv_error(e: csv::Error, record: usize) -> crate::Error {
    let message = e.to_string();
    match e.into_kind() {
        csv::ErrorKind::Io(source) => crate::Error::Io {
            context: "export file".to_string(),
            source,
        },
        _ => crate::Error::parse(format!("record {record}"), message),
    }
}

/// Maps an I/O error while reading the export onto the crate taxonomy.
pub(crate) fn read_error(e: std::io::Error) -> crate::Error {
    crate::Error::Io {
        context: "export file".to_string(),
        source: e,
    }
}
