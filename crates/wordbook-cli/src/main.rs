//! Wordbook CLI - offline-first vocabulary notebook
//!
//! Words are stored locally first; `sync` pushes queued changes and
//! `translate` fills in words that were added without a connection.

mod cli;
mod commands;
mod error;

#[cfg(test)]
mod tests;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use wordbook_core::EngineConfig;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::common::Workspace;
use crate::commands::delete::run_delete;
use crate::commands::edit::run_edit;
use crate::commands::list::{run_list, run_recent};
use crate::commands::reset::run_reset;
use crate::commands::search::run_search;
use crate::commands::show::run_show;
use crate::commands::status::run_status;
use crate::commands::sync::run_sync;
use crate::commands::translate::run_translate;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "wordbook=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::from_env()?;
    let workspace = Workspace::resolve(cli.user, cli.data_dir, config)?;

    match cli.command {
        Commands::Add {
            headword,
            parts_of_speech,
            meanings,
            no_translate,
        } => run_add(&workspace, &headword, &parts_of_speech, &meanings, no_translate).await?,
        Commands::List { json } => run_list(&workspace, json).await?,
        Commands::Recent { limit, json } => run_recent(&workspace, limit, json).await?,
        Commands::Search { query, json } => run_search(&workspace, &query, json).await?,
        Commands::Show { entry } => run_show(&workspace, &entry).await?,
        Commands::Edit {
            entry,
            headword,
            parts_of_speech,
            meanings,
        } => {
            run_edit(
                &workspace,
                &entry,
                headword.as_deref(),
                &parts_of_speech,
                &meanings,
            )
            .await?;
        }
        Commands::Delete { entry } => run_delete(&workspace, &entry).await?,
        Commands::Sync => run_sync(&workspace).await?,
        Commands::Translate => run_translate(&workspace).await?,
        Commands::Status => run_status(&workspace).await?,
        Commands::Reset { yes } => run_reset(&workspace, yes).await?,
    }

    Ok(())
}
