//! Structured logging.

use crate::config::LoggingSettings;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "PASS_IMPORT_LOG";

const DEFAULT_LEVEL: &str = "warn";
const VERBOSE_LEVEL: &str = "pass_import=debug,info";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parses a format name, defaulting to pretty output.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Logging configuration.
#[derive(Debug)]
pub struct LoggingConfig {
    /// Filter applied to every event.
    pub filter: EnvFilter,
    /// Output format.
    pub format: LogFormat,
    /// Log file; stderr when `None`.
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Builds logging configuration from config settings with env overrides.
    ///
    /// Filter precedence: `--verbose`, then `PASS_IMPORT_LOG`, then
    /// `RUST_LOG`, then the config file level, then `warn`.
    #[must_use]
    pub fn from_settings(settings: Option<&LoggingSettings>, verbose: bool) -> Self {
        let directive = if verbose {
            VERBOSE_LEVEL.to_string()
        } else {
            std::env::var(LOG_ENV)
                .ok()
                .or_else(|| std::env::var("RUST_LOG").ok())
                .filter(|v| !v.trim().is_empty())
                .or_else(|| settings.and_then(|s| s.level.clone()))
                .unwrap_or_else(|| DEFAULT_LEVEL.to_string())
        };

        let filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
            eprintln!("Ignoring invalid log filter '{directive}': {e}");
            EnvFilter::new(DEFAULT_LEVEL)
        });

        Self {
            filter,
            format: settings
                .and_then(|s| s.format.as_deref())
                .map(LogFormat::parse)
                .unwrap_or_default(),
            file: settings.and_then(|s| s.file.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("anything"), LogFormat::Pretty);
    }

    #[test]
    fn test_from_settings_format_and_file() {
        let settings = LoggingSettings {
            level: Some("info".to_string()),
            format: Some("json".to_string()),
            file: Some(PathBuf::from("/tmp/pass-import.log")),
        };
        let config = LoggingConfig::from_settings(Some(&settings), true);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.file, Some(PathBuf::from("/tmp/pass-import.log")));
    }
}
