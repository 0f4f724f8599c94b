//! `sitedesk store` — entity store inspection.

use std::path::PathBuf;

use clap::Subcommand;
use sitedesk_model::Family;
use sitedesk_store::{EntityRead, SqliteStore};

use crate::exit_codes::EXIT_ERROR;
use crate::CliError;

#[derive(Subcommand)]
pub enum StoreCommands {
    /// List entities as JSON
    #[command(after_help = "\
Examples:
  sitedesk store list --store jobs.db
  sitedesk store list --store jobs.db --family job")]
    List {
        /// SQLite store path
        #[arg(long)]
        store: PathBuf,

        /// Entity family to list (job, office, contact); all when omitted
        #[arg(long)]
        family: Option<String>,
    },
}

pub fn cmd_store(cmd: StoreCommands) -> Result<(), CliError> {
    match cmd {
        StoreCommands::List { store, family } => cmd_store_list(store, family),
    }
}

fn cmd_store_list(store_path: PathBuf, family: Option<String>) -> Result<(), CliError> {
    let families: Vec<Family> = match family {
        Some(name) => vec![name.parse().map_err(CliError::usage)?],
        None => Family::ALL.to_vec(),
    };

    let store = SqliteStore::open(&store_path)
        .map_err(|e| CliError::with_code(EXIT_ERROR, e.to_string()))?;

    let mut entities = Vec::new();
    for family in families {
        entities.extend(
            store
                .list(family)
                .map_err(|e| CliError::with_code(EXIT_ERROR, e.to_string()))?,
        );
    }

    let json = serde_json::to_string_pretty(&entities)
        .map_err(|e| CliError::with_code(EXIT_ERROR, e.to_string()))?;
    println!("{json}");
    eprintln!("{} entit{}", entities.len(), if entities.len() == 1 { "y" } else { "ies" });
    Ok(())
}
