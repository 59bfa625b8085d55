//! Writing entries to the password store.
//!
//! The store is reached through a [`SecretSink`]: [`PassCommandSink`] runs
//! the store's insert command once per entry, [`MemorySink`] keeps entries
//! in memory for tests. [`StoreWriter`] sits in front of the sink and turns
//! writes into previews in dry-run mode.

mod memory;
mod pass;
mod payload;

pub use memory::MemorySink;
pub use pass::PassCommandSink;
pub use payload::Payload;

use crate::Result;
use crate::config::{ImportConfig, StoreConfig};
use tracing::instrument;

/// Destination for rendered entries.
///
/// Implementations report a refused entry as [`crate::Error::Write`]; the
/// import continues with the next entry.
pub trait SecretSink {
    /// Stores `payload` at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Write`] if the store refuses the entry.
    fn write(&mut self, path: &str, payload: &Payload, overwrite: bool) -> Result<()>;
}

/// What a dry run would have done for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    /// Store command line, program first.
    pub command: Vec<String>,
    /// Payload that would be fed on stdin.
    pub payload: Payload,
}

impl Preview {
    /// Returns the command line quoted for a POSIX shell.
    #[must_use]
    pub fn command_string(&self) -> String {
        self.command
            .iter()
            .map(|arg| shell_quote(arg))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl std::fmt::Display for Preview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cmd={} entry=\n{}", self.command_string(), self.payload)
    }
}

fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./=:@%+,".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Result of handing one entry to the [`StoreWriter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The sink accepted the entry.
    Written,
    /// Dry run: nothing was written.
    Previewed(Preview),
}

/// Applies force and dry-run modes in front of a sink.
pub struct StoreWriter<S: SecretSink> {
    sink: S,
    store: StoreConfig,
    overwrite: bool,
    dry_run: bool,
}

impl<S: SecretSink> StoreWriter<S> {
    /// Creates a writer using the modes of `config`.
    #[must_use]
    pub fn new(sink: S, config: &ImportConfig) -> Self {
        Self {
            sink,
            store: config.store.clone(),
            overwrite: config.force,
            dry_run: config.dry_run,
        }
    }

    /// Writes or previews one entry.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Write`] if the sink refuses the entry.
    #[instrument(skip(self, payload), fields(dry_run = self.dry_run))]
    pub fn write(&mut self, path: &str, payload: &Payload) -> Result<WriteOutcome> {
        if self.dry_run {
            return Ok(WriteOutcome::Previewed(Preview {
                command: self.store.command_line(path, self.overwrite),
                payload: payload.clone(),
            }));
        }

        self.sink.write(path, payload, self.overwrite)?;
        tracing::debug!(path, "Entry written");
        Ok(WriteOutcome::Written)
    }

    /// Returns the underlying sink.
    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Consumes the writer, returning the sink.
    #[must_use]
    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> Payload {
        Payload::render(
            &crate::models::CanonicalEntry {
                password: Some("pw".to_string()),
                ..Default::default()
            },
            true,
        )
    }

    #[test]
    fn test_dry_run_previews_without_writing() {
        let config = ImportConfig::default().with_dry_run(true).with_force(true);
        let mut writer = StoreWriter::new(MemorySink::new(), &config);

        let outcome = writer.write("Web/My Mail", &payload()).unwrap();

        let WriteOutcome::Previewed(preview) = outcome else {
            panic!("expected a preview");
        };
        assert_eq!(
            preview.command_string(),
            "pass insert --multiline --force 'Web/My Mail'"
        );
        assert_eq!(
            preview.to_string(),
            "cmd=pass insert --multiline --force 'Web/My Mail' entry=\npw\n"
        );
        assert_eq!(writer.sink().write_count(), 0);
    }

    #[test]
    fn test_preview_uses_configured_store() {
        let config = ImportConfig::default()
            .with_dry_run(true)
            .with_store(StoreConfig {
                command: "gopass".to_string(),
                args: vec!["insert".to_string(), "-m".to_string()],
                force_flag: "-f".to_string(),
            });
        let mut writer = StoreWriter::new(MemorySink::new(), &config);

        let WriteOutcome::Previewed(preview) = writer.write("Bank", &payload()).unwrap() else {
            panic!("expected a preview");
        };
        assert_eq!(preview.command, vec!["gopass", "insert", "-m", "Bank"]);
    }

    #[test]
    fn test_live_write_reaches_sink() {
        let mut writer = StoreWriter::new(MemorySink::new(), &ImportConfig::default());
        assert_eq!(
            writer.write("Bank", &payload()).unwrap(),
            WriteOutcome::Written
        );
        let sink = writer.into_sink();
        assert_eq!(sink.get("Bank"), Some(&payload()));
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("Web/Mail"), "Web/Mail");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
    }
}
