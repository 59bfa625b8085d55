//! Data models for the import pipeline.
//!
//! [`RawRecord`] is what a format parser produces; [`CanonicalEntry`] is what
//! field inference and path building turn it into.

mod entry;
mod record;

pub use entry::CanonicalEntry;
pub use record::{RawField, RawRecord};
