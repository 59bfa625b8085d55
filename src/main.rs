//! Binary entry point for pass-import.
//!
//! Reads one password manager export and inserts its entries into `pass`.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow option_if_let_else for environment variable fallback chains
#![allow(clippy::option_if_let_else)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::Parser;
use pass_import::io::{ImportProgress, ProgressCallback, RunState};
use pass_import::observability::{self, InitOptions};
use pass_import::{
    Format, ImportConfig, ImportOptions, ImportResult, ImportService, NameField, PassCommandSink,
};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

/// Environment variable naming a config file.
const CONFIG_ENV: &str = "PASS_IMPORT_CONFIG_PATH";

/// Import password manager exports into pass.
#[derive(Parser)]
#[command(name = "pass-import")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Export file to import.
    file: PathBuf,

    /// Overwrite existing entries.
    #[arg(short, long)]
    force: bool,

    /// Group for entries that have none.
    #[arg(short, long, value_name = "GROUP")]
    default: Option<String>,

    /// Field used as the entry name: title or url.
    #[arg(short, long, value_name = "FIELD")]
    name: Option<String>,

    /// Write url, login, otp, extra attributes and notes below the password.
    #[arg(short, long, overrides_with = "no_meta")]
    meta: bool,

    /// Write the password only.
    #[arg(long)]
    no_meta: bool,

    /// Drop browser autofill noise from extra attributes.
    #[arg(long)]
    filter: bool,

    /// Print what would be inserted without touching the store.
    #[arg(long)]
    dry_run: bool,

    /// Prefix for every store path.
    #[arg(short, long, value_name = "ROOT")]
    path: Option<String>,

    /// Export format (delimited, 1pif, html, keyvalue, gorilla); detected
    /// from the file when omitted.
    #[arg(long, value_name = "FORMAT")]
    format: Option<String>,

    /// Keep entries without a password next to the others.
    #[arg(long)]
    no_notes_namespace: bool,

    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init_from_settings(
        &config.logging,
        InitOptions {
            verbose: cli.verbose,
        },
    ) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(&cli, config) {
        Ok(result) if result.has_failures() => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the import.
fn run(cli: &Cli, config: ImportConfig) -> Result<ImportResult, Box<dyn std::error::Error>> {
    let config = apply_flags(cli, config)?;
    let options = match cli.format.as_deref() {
        Some(format) => ImportOptions::default().with_format(format.parse::<Format>()?),
        None => ImportOptions::default(),
    };

    let sink = PassCommandSink::from_config(&config.store);
    let mut service = ImportService::new(&config, sink);
    let progress: Option<ProgressCallback> = if config.dry_run {
        None
    } else {
        Some(Box::new(print_progress))
    };

    let result = service.import_from_file(&cli.file, &options, progress)?;
    report(&result, config.dry_run);
    Ok(result)
}

/// Applies command-line flags over the loaded configuration.
fn apply_flags(cli: &Cli, mut config: ImportConfig) -> pass_import::Result<ImportConfig> {
    config.force |= cli.force;
    config.dry_run |= cli.dry_run;
    if let Some(group) = &cli.default {
        config.default_group = Some(group.clone());
    }
    if let Some(name) = cli.name.as_deref() {
        config.name = name.parse::<NameField>()?;
    }
    if cli.no_meta {
        config.features.metadata = false;
    } else if cli.meta {
        config.features.metadata = true;
    }
    config.features.noise_filter |= cli.filter;
    if cli.no_notes_namespace {
        config.features.notes_namespace = false;
    }
    if let Some(root) = &cli.path {
        config.root = Some(root.clone());
    }
    Ok(config)
}

/// Prints running counts while entries are written.
fn print_progress(progress: &ImportProgress) {
    if progress.state != RunState::Writing {
        return;
    }
    print!(
        "\rImported {} entries ({} failed)",
        progress.succeeded, progress.failed
    );
    let _ = std::io::stdout().flush();
}

/// Prints the summary, previews and failures.
fn report(result: &ImportResult, dry_run: bool) {
    if dry_run {
        for preview in &result.previews {
            println!("{preview}");
        }
        println!(
            "Would import {} of {} entries",
            result.succeeded, result.attempted
        );
    } else {
        println!(
            "\rImported {} of {} entries",
            result.succeeded, result.attempted
        );
    }
    if result.skipped_duplicates > 0 {
        println!("Skipped {} duplicate entries", result.skipped_duplicates);
    }

    if result.has_failures() {
        eprintln!("\nImport encountered {} errors:", result.failed.len());
        for failure in &result.failed {
            eprintln!("  {}: {}", failure.path, failure.reason);
        }
        eprintln!(
            "\nThese usually mean an entry with the same name already exists in the store, \
             or the export holds several entries with the same name. \
             Rerun with --force to overwrite existing entries."
        );
    }
}

/// Loads configuration.
fn load_config(path: Option<&str>) -> Result<ImportConfig, Box<dyn std::error::Error>> {
    // If a path is provided, load from that file
    if let Some(config_path) = path {
        return ImportConfig::load_from_file(std::path::Path::new(config_path))
            .map_err(std::convert::Into::into);
    }

    // Environment override for config path
    if let Ok(config_path) = std::env::var(CONFIG_ENV)
        && !config_path.trim().is_empty()
    {
        return ImportConfig::load_from_file(std::path::Path::new(&config_path))
            .map_err(std::convert::Into::into);
    }

    // Otherwise, load from default location
    Ok(ImportConfig::load_default())
}
