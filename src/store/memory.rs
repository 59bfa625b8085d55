//! In-memory sink.

use super::{Payload, SecretSink};
use crate::{Error, Result};
use std::collections::HashSet;

/// Sink that keeps entries in memory.
///
/// Mirrors the store's overwrite rule: writing to an occupied path without
/// `overwrite` fails. Individual paths can be set up to fail regardless.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    entries: Vec<(String, Payload)>,
    failing: HashSet<String>,
    writes: usize,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates an entry, as if it were already in the store.
    #[must_use]
    pub fn with_existing(mut self, path: impl Into<String>, payload: Payload) -> Self {
        self.entries.push((path.into(), payload));
        self
    }

    /// Makes every write to `path` fail.
    #[must_use]
    pub fn failing_on(mut self, path: impl Into<String>) -> Self {
        self.failing.insert(path.into());
        self
    }

    /// Returns the payload stored at `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Payload> {
        self.entries
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, payload)| payload)
    }

    /// Returns all entries in first-write order.
    #[must_use]
    pub fn entries(&self) -> &[(String, Payload)] {
        &self.entries
    }

    /// Returns the number of write calls, including refused ones.
    #[must_use]
    pub const fn write_count(&self) -> usize {
        self.writes
    }
}

impl SecretSink for MemorySink {
    fn write(&mut self, path: &str, payload: &Payload, overwrite: bool) -> Result<()> {
        self.writes += 1;
        if self.failing.contains(path) {
            return Err(Error::Write {
                path: path.to_string(),
                reason: "simulated store failure".to_string(),
            });
        }

        match self.entries.iter_mut().find(|(p, _)| p == path) {
            Some(_) if !overwrite => Err(Error::Write {
                path: path.to_string(),
                reason: format!("an entry already exists for {path}"),
            }),
            Some((_, existing)) => {
                *existing = payload.clone();
                Ok(())
            },
            None => {
                self.entries.push((path.to_string(), payload.clone()));
                Ok(())
            },
        }
    }
}
