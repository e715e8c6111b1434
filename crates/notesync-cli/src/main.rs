//! notesync CLI - Nextcloud Notes from the terminal
//!
//! Every command works against the local note cache. Unless `--nosync` is
//! given, each invocation also runs one sync pass with the configured server.

mod cli;
mod commands;
mod config_file;
mod error;


use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{CategoryCommands, Cli, Commands};
use crate::commands::category::{run_category_get, run_category_rm, run_category_set};
use crate::commands::common::open_session;
use crate::commands::create::run_create;
use crate::commands::delete::run_delete;
use crate::commands::dump::run_dump;
use crate::commands::edit::run_edit;
use crate::commands::export::{run_export, ExportOptions};
use crate::commands::favorite::run_favorite;
use crate::commands::import::run_import;
use crate::commands::list::run_list;
use crate::commands::sync::run_sync;
use crate::config_file::{load_config, resolve_db_path};
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

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let db_path = resolve_db_path(cli.db_path, &config)?;
    let session = open_session(&config, &db_path, cli.nosync).await?;

    match cli.command {
        Commands::List { regex, json, terms } => {
            run_list(&terms, regex, json, &session)?;
        }
        Commands::Dump { key, regex, terms } => {
            run_dump(key.as_deref(), &terms, regex, &session)?;
        }
        Commands::Create { content } => {
            run_create(&content, &session).await?;
        }
        Commands::Import { source } => {
            run_import(source.as_deref(), &session).await?;
        }
        Commands::Export {
            key,
            format,
            output,
            regex,
            terms,
        } => {
            let options = ExportOptions {
                key: key.as_deref(),
                terms: &terms,
                regex,
                format,
                output: output.as_deref(),
            };
            run_export(&options, &session)?;
        }
        Commands::Edit { key } => run_edit(&key, &session).await?,
        Commands::Delete { key } => run_delete(&key, &session).await?,
        Commands::Favorite { key } => run_favorite(&key, true, &session).await?,
        Commands::Unfavorite { key } => run_favorite(&key, false, &session).await?,
        Commands::Cat { command } => match command {
            CategoryCommands::Get { key } => {
                run_category_get(&key, &session)?;
            }
            CategoryCommands::Set { key, category } => {
                run_category_set(&key, &category, &session).await?;
            }
            CategoryCommands::Rm { key } => run_category_rm(&key, &session).await?,
        },
        Commands::Sync => run_sync(&session).await?,
    }

    Ok(())
}

/// Log to stderr so stdout stays scriptable.
fn init_tracing(verbose: bool) {
    let directive = if verbose {
        "notesync=debug"
    } else {
        "notesync=info"
    };
    let filter = EnvFilter::from_default_env();
    let filter = match directive.parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
