//! Configuration management.
//!
//! An [`ImportConfig`] is assembled from defaults, an optional TOML file and
//! command-line flags, in that order of precedence.
//!
//! ```toml
//! [import]
//! default_group = "imported"
//! name = "title"
//! filter = true
//!
//! [store]
//! command = "gopass"
//! args = ["insert", "--multiline"]
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

mod features;

pub use features::FeatureFlags;

use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;

/// Default prefix for entries that carry no password.
pub const DEFAULT_NOTES_PREFIX: &str = "notes";

/// Which field becomes the basename of an entry's store path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameField {
    /// Use the entry title.
    #[default]
    Title,
    /// Use the entry url, without its scheme.
    Url,
}

impl FromStr for NameField {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "title" => Ok(Self::Title),
            "url" => Ok(Self::Url),
            _ => Err(crate::Error::InvalidInput(format!(
                "unknown name field '{s}' (expected 'title' or 'url')"
            ))),
        }
    }
}

/// How to reach the external password store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Program to run.
    pub command: String,
    /// Arguments placed before the optional force flag and the path.
    pub args: Vec<String>,
    /// Flag that allows overwriting an existing entry.
    pub force_flag: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            command: "pass".to_string(),
            args: vec!["insert".to_string(), "--multiline".to_string()],
            force_flag: "--force".to_string(),
        }
    }
}

impl StoreConfig {
    /// Returns the full command line for inserting `path`.
    #[must_use]
    pub fn command_line(&self, path: &str, overwrite: bool) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 3);
        argv.push(self.command.clone());
        argv.extend(self.args.iter().cloned());
        if overwrite && !self.force_flag.is_empty() {
            argv.push(self.force_flag.clone());
        }
        argv.push(path.to_string());
        argv
    }
}

/// Logging settings as read from the config file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Filter directive, e.g. `info` or `pass_import=debug`.
    pub level: Option<String>,
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Log file; logs go to stderr when unset.
    pub file: Option<PathBuf>,
}

/// Main configuration for an import run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    /// Feature flags.
    pub features: FeatureFlags,
    /// Overwrite existing store entries.
    pub force: bool,
    /// Preview entries instead of writing them.
    pub dry_run: bool,
    /// Group used for entries that have none.
    pub default_group: Option<String>,
    /// Prefix placed in front of every store path.
    pub root: Option<String>,
    /// Which field names the entry.
    pub name: NameField,
    /// Prefix for entries without a password.
    pub notes_prefix: String,
    /// External store invocation.
    pub store: StoreConfig,
    /// Logging settings.
    pub logging: LoggingSettings,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            features: FeatureFlags::default(),
            force: false,
            dry_run: false,
            default_group: None,
            root: None,
            name: NameField::Title,
            notes_prefix: DEFAULT_NOTES_PREFIX.to_string(),
            store: StoreConfig::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Import defaults.
    pub import: Option<ConfigFileImport>,
    /// Store invocation.
    pub store: Option<ConfigFileStore>,
    /// Logging settings.
    pub logging: Option<LoggingSettings>,
}

/// Import section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileImport {
    /// Overwrite existing entries.
    pub force: Option<bool>,
    /// Default group.
    pub default_group: Option<String>,
    /// Path basename field.
    pub name: Option<String>,
    /// Write metadata lines.
    pub meta: Option<bool>,
    /// Noise filter.
    pub filter: Option<bool>,
    /// Root prefix.
    pub root: Option<String>,
    /// Nest password-less entries.
    pub notes_namespace: Option<bool>,
    /// Prefix for password-less entries.
    pub notes_prefix: Option<String>,
}

/// Store section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileStore {
    /// Program to run.
    pub command: Option<String>,
    /// Leading arguments.
    pub args: Option<Vec<String>>,
    /// Overwrite flag.
    pub force_flag: Option<String>,
}

impl ImportConfig {
    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if it holds
    /// an invalid `name` value.
    pub fn load_from_file(path: &std::path::Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;

        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for [`ConfigFile`].
    pub fn from_toml(contents: &str) -> crate::Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;

        Self::from_config_file(file)
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the platform config dir (`~/.config/pass-import/config.toml` on
    /// Linux) and returns defaults if no file is found or it cannot be parsed.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let path = base_dirs
            .config_dir()
            .join("pass-import")
            .join("config.toml");
        if path.exists() {
            match Self::load_from_file(&path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Ignoring unreadable config file"
                    );
                },
            }
        }

        Self::default()
    }

    /// Converts a `ConfigFile` to `ImportConfig`.
    fn from_config_file(file: ConfigFile) -> crate::Result<Self> {
        let mut config = Self::default();

        if let Some(import) = file.import {
            if let Some(v) = import.force {
                config.force = v;
            }
            if let Some(name) = import.name {
                config.name = name.parse()?;
            }
            if let Some(v) = import.meta {
                config.features.metadata = v;
            }
            if let Some(v) = import.filter {
                config.features.noise_filter = v;
            }
            if let Some(v) = import.notes_namespace {
                config.features.notes_namespace = v;
            }
            if let Some(prefix) = import.notes_prefix {
                config.notes_prefix = prefix;
            }
            config.default_group = import.default_group;
            config.root = import.root;
        }
        if let Some(store) = file.store {
            if let Some(command) = store.command {
                config.store.command = command;
            }
            if let Some(args) = store.args {
                config.store.args = args;
            }
            if let Some(flag) = store.force_flag {
                config.store.force_flag = flag;
            }
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }

        Ok(config)
    }

    /// Enables or disables overwriting.
    #[must_use]
    pub const fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Enables or disables dry run mode.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sets the default group.
    #[must_use]
    pub fn with_default_group(mut self, group: impl Into<String>) -> Self {
        self.default_group = Some(group.into());
        self
    }

    /// Sets the root prefix.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Sets the basename field.
    #[must_use]
    pub const fn with_name(mut self, name: NameField) -> Self {
        self.name = name;
        self
    }

    /// Replaces the feature flags.
    #[must_use]
    pub const fn with_features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Sets the store invocation.
    #[must_use]
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }
}
