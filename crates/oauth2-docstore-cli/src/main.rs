mod cli;
mod commands;
mod config;
mod observability;
mod output;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use oauth2_docstore::AuthStorage;
use oauth2_docstore_couchdb::CouchClient;

use crate::cli::{ClientCommands, Cli, Commands, TokenCommands};
use crate::config::{AppConfig, load_config};
use crate::output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv()
        && !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
    {
        eprintln!("Warning: Failed to load .env file: {e}");
    }

    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.format.unwrap_or_default();

    let mut cfg = load_config(&cli.config).map_err(anyhow::Error::msg)?;
    cli.apply_overrides(&mut cfg);
    cfg.validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid configuration")?;

    observability::init_tracing(&cfg.logging.level);
    tracing::debug!(
        path = %cli.config.display(),
        url = %cfg.couchdb.masked_url(),
        database = %cfg.couchdb.database,
        "Configuration loaded"
    );

    match &cli.command {
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&cfg.redacted())?);
        }
        Commands::Ping => {
            let client = connect(&cfg)?;
            commands::setup::ping_and_close(&client).await?;
        }
        Commands::Setup => {
            let client = connect(&cfg)?;
            let result = commands::setup::setup(&client, &cfg).await;
            client.close();
            result?;
        }
        Commands::Client(args) => {
            let storage = open_storage(&cfg, false).await?;
            let result = match &args.command {
                ClientCommands::Set(set_args) => {
                    commands::client::set(storage.clients(), set_args).await
                }
                ClientCommands::Get(get_args) => {
                    commands::client::get(storage.clients(), get_args, format).await
                }
                ClientCommands::Remove(id_args) => {
                    commands::client::remove(storage.clients(), &id_args.id).await
                }
            };
            storage.close().await;
            result?;
        }
        Commands::Token(args) => {
            let storage = open_storage(&cfg, true).await?;
            let result = match &args.command {
                TokenCommands::Get(key_args) => {
                    commands::token::get(storage.tokens(), key_args, format).await
                }
                TokenCommands::Remove(key_args) => {
                    commands::token::remove(storage.tokens(), key_args).await
                }
            };
            storage.close().await;
            result?;
        }
    }

    Ok(())
}

fn connect(cfg: &AppConfig) -> Result<CouchClient> {
    CouchClient::connect(&cfg.couchdb).context("Failed to create CouchDB session")
}

/// Opens the stores; token commands also make sure the views exist.
async fn open_storage(cfg: &AppConfig, with_indexes: bool) -> Result<AuthStorage> {
    let client = connect(cfg)?;
    let db = Arc::new(client.database(&cfg.couchdb.database)?);
    if with_indexes {
        AuthStorage::open_with_token_config(db, &cfg.token)
            .await
            .context("Failed to install token views")
    } else {
        Ok(AuthStorage::with_token_config(db, &cfg.token))
    }
}
