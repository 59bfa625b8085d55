//! Sink backed by the store's insert command.

use super::{Payload, SecretSink};
use crate::config::StoreConfig;
use crate::{Error, Result};
use std::io::Write;
use std::process::{Command, Stdio};

/// Runs `pass insert --multiline [--force] <path>` (or the configured
/// equivalent) once per entry, feeding the payload on stdin.
#[derive(Debug, Clone)]
pub struct PassCommandSink {
    store: StoreConfig,
}

impl PassCommandSink {
    /// Creates a sink for the given store invocation.
    #[must_use]
    pub fn from_config(store: &StoreConfig) -> Self {
        Self {
            store: store.clone(),
        }
    }
}

impl Default for PassCommandSink {
    fn default() -> Self {
        Self::from_config(&StoreConfig::default())
    }
}

impl SecretSink for PassCommandSink {
    fn write(&mut self, path: &str, payload: &Payload, overwrite: bool) -> Result<()> {
        let argv = self.store.command_line(path, overwrite);
        let write_error = |reason: String| Error::Write {
            path: path.to_string(),
            reason,
        };

        let mut child = Command::new(&self.store.command)
            .args(&argv[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| write_error(format!("cannot run {}: {e}", self.store.command)))?;

        // Dropping stdin closes the pipe so the command sees end of input.
        let fed = child
            .stdin
            .take()
            .map_or(Ok(()), |mut stdin| stdin.write_all(payload.as_bytes()));

        let output = child
            .wait_with_output()
            .map_err(|e| write_error(format!("cannot wait for {}: {e}", self.store.command)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = match stderr.trim() {
                "" => output.status.to_string(),
                message => message.to_string(),
            };
            tracing::warn!(path, %reason, "Store command failed");
            return Err(write_error(reason));
        }
        fed.map_err(|e| write_error(format!("cannot feed payload: {e}")))
    }
}
