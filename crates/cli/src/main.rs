// sitedesk CLI - headless import operations against the entity store

mod exit_codes;
mod import_cmd;
mod store_cmd;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "sitedesk")]
#[command(about = "Construction dashboard import tooling (headless)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run or validate spreadsheet imports
    Import {
        #[command(subcommand)]
        command: import_cmd::ImportCommands,
    },
    /// Inspect the entity store
    Store {
        #[command(subcommand)]
        command: store_cmd::StoreCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        None => {
            eprintln!("Usage: sitedesk <command> [options]");
            eprintln!("       sitedesk --help for more information");
            Ok(())
        }
        Some(Commands::Import { command }) => import_cmd::cmd_import(command),
        Some(Commands::Store { command }) => store_cmd::cmd_store(command),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {message}");
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {hint}");
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn with_code(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }
}
