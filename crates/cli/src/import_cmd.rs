//! `sitedesk import` — profile-driven spreadsheet imports.

use std::path::PathBuf;

use clap::Subcommand;
use sitedesk_import::{load_csv_records, ImportError, ImportProfile, RunReport};
use sitedesk_store::{EntityStore, MemoryStore, SqliteStore};

use crate::exit_codes::{
    EXIT_IMPORT_CONFLICTS, EXIT_IMPORT_INVALID_PROFILE, EXIT_IMPORT_ROW_ERRORS,
    EXIT_IMPORT_RUNTIME,
};
use crate::CliError;

#[derive(Subcommand)]
pub enum ImportCommands {
    /// Run an import from a TOML profile and a CSV export
    #[command(after_help = "\
Examples:
  sitedesk import run dodge.toml --csv weekly.csv --store jobs.db --dry-run
  sitedesk import run dodge.toml --csv weekly.csv --store jobs.db
  sitedesk import run dodge.toml --csv weekly.csv --json
  sitedesk import run dodge.toml --csv weekly.csv --store jobs.db --output report.json")]
    Run {
        /// Path to the import profile (.toml)
        profile: PathBuf,

        /// CSV export to import
        #[arg(long)]
        csv: PathBuf,

        /// SQLite store path (omitted: empty in-memory store, for previews)
        #[arg(long)]
        store: Option<PathBuf>,

        /// Classify and report without committing any writes
        #[arg(long)]
        dry_run: bool,

        /// Output the JSON report to stdout instead of just the summary
        #[arg(long)]
        json: bool,

        /// Write the JSON report to a file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate an import profile without running
    #[command(after_help = "\
Examples:
  sitedesk import validate dodge.toml")]
    Validate {
        /// Path to the import profile (.toml)
        profile: PathBuf,
    },
}

pub fn cmd_import(cmd: ImportCommands) -> Result<(), CliError> {
    match cmd {
        ImportCommands::Run { profile, csv, store, dry_run, json, output } => {
            cmd_import_run(profile, csv, store, dry_run, json, output)
        }
        ImportCommands::Validate { profile } => cmd_import_validate(profile),
    }
}

fn import_exit_code(err: &ImportError) -> u8 {
    match err {
        ImportError::ProfileParse(_)
        | ImportError::ProfileValidation(_)
        | ImportError::UnknownFamily(_) => EXIT_IMPORT_INVALID_PROFILE,
        ImportError::MissingColumn { .. } | ImportError::Csv(_) => EXIT_IMPORT_RUNTIME,
    }
}

fn runtime_err(msg: impl Into<String>) -> CliError {
    CliError::with_code(EXIT_IMPORT_RUNTIME, msg)
}

fn cmd_import_run(
    profile_path: PathBuf,
    csv_path: PathBuf,
    store_path: Option<PathBuf>,
    dry_run: bool,
    json_output: bool,
    output_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let profile_str = std::fs::read_to_string(&profile_path)
        .map_err(|e| runtime_err(format!("cannot read profile: {e}")))?;
    let profile = ImportProfile::from_toml(&profile_str)
        .map_err(|e| CliError::with_code(import_exit_code(&e), e.to_string()))?;

    let csv_data = std::fs::read_to_string(&csv_path)
        .map_err(|e| runtime_err(format!("cannot read {}: {e}", csv_path.display())))?;
    let records = load_csv_records(&csv_data, &profile)
        .map_err(|e| CliError::with_code(import_exit_code(&e), e.to_string()))?;

    let mut store: Box<dyn EntityStore> = match store_path {
        Some(ref path) => Box::new(SqliteStore::open(path).map_err(|e| runtime_err(e.to_string()))?),
        None => Box::new(MemoryStore::new()),
    };

    let report = sitedesk_import::run(store.as_mut(), &profile.family, &records, dry_run)
        .map_err(|e| CliError::with_code(import_exit_code(&e), e.to_string()))?;

    let json_str = serde_json::to_string_pretty(&report)
        .map_err(|e| runtime_err(format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| runtime_err(format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    print_summary(&report);

    if report.summary.conflicts > 0 {
        return Err(CliError::with_code(EXIT_IMPORT_CONFLICTS, "conflicts need review"));
    }
    if !report.errors.is_empty() {
        return Err(CliError::with_code(EXIT_IMPORT_ROW_ERRORS, "some rows errored"));
    }
    Ok(())
}

/// Human summary to stderr; stdout stays machine-readable.
fn print_summary(report: &RunReport) {
    let s = &report.summary;
    let mode = if report.meta.dry_run { " (dry run)" } else { "" };
    eprintln!(
        "{} import{}: {} row(s) — {} inserted, {} updated, {} unchanged, {} locked, {} conflict(s), {} error(s)",
        report.meta.family,
        mode,
        report.outcomes.len() + report.errors.len(),
        s.inserted,
        s.updated,
        s.unchanged,
        s.skipped_locked,
        s.conflicts,
        report.errors.len(),
    );

    for outcome in &report.outcomes {
        if let sitedesk_import::Decision::Conflict { reason, .. } = &outcome.decision {
            eprintln!("  row {}: conflict — {}", outcome.row, reason);
        }
    }
    for error in &report.errors {
        eprintln!("  row {}: error — {}", error.row, error.message);
    }
}

fn cmd_import_validate(profile_path: PathBuf) -> Result<(), CliError> {
    let profile_str = std::fs::read_to_string(&profile_path)
        .map_err(|e| runtime_err(format!("cannot read profile: {e}")))?;

    match ImportProfile::from_toml(&profile_str) {
        Ok(profile) => {
            eprintln!(
                "valid: profile '{}' targets family '{}' with {} column(s), {} default(s)",
                profile.name,
                profile.family,
                profile.columns.len(),
                profile.defaults.len(),
            );
            Ok(())
        }
        Err(e) => Err(CliError::with_code(EXIT_IMPORT_INVALID_PROFILE, e.to_string())),
    }
}
