use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use oauth2_docstore::TokenIndex;

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "oauth2-docstore")]
#[command(about = "Manage OAuth 2.0 clients and tokens stored in CouchDB")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (TOML); missing files are ignored
    #[arg(
        short,
        long,
        global = true,
        env = "OAUTH2_DOCSTORE_CONFIG",
        default_value = "oauth2-docstore.toml"
    )]
    pub config: PathBuf,

    /// CouchDB server URL (overrides config)
    #[arg(long, global = true, env = "COUCHDB_URL")]
    pub url: Option<String>,

    /// CouchDB user name
    #[arg(short, long, global = true, env = "COUCHDB_USER")]
    pub username: Option<String>,

    /// CouchDB password
    #[arg(long, global = true, env = "COUCHDB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Database holding clients and tokens
    #[arg(short, long, global = true, env = "COUCHDB_DATABASE")]
    pub database: Option<String>,

    /// Log filter, e.g. `debug` or `oauth2_docstore=trace`
    #[arg(long, global = true, env = "OAUTH2_DOCSTORE_LOG")]
    pub log: Option<String>,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

impl Cli {
    /// Applies command-line values over the loaded configuration.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(url) = &self.url {
            config.couchdb.url.clone_from(url);
        }
        if let Some(username) = &self.username {
            config.couchdb.username = Some(username.clone());
        }
        if let Some(password) = &self.password {
            config.couchdb.password = Some(password.clone());
        }
        if let Some(database) = &self.database {
            config.couchdb.database.clone_from(database);
        }
        if let Some(log) = &self.log {
            config.logging.level.clone_from(log);
        }
    }
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that CouchDB is reachable
    Ping,
    /// Create the database and install the token views
    Setup,
    /// Manage client registrations
    Client(ClientArgs),
    /// Inspect and revoke tokens
    Token(TokenArgs),
    /// Show the effective configuration
    Config,
}

#[derive(Args)]
pub struct ClientArgs {
    #[command(subcommand)]
    pub command: ClientCommands,
}

#[derive(Subcommand)]
pub enum ClientCommands {
    /// Register a client, replacing any existing registration
    Set(ClientSetArgs),
    /// Show a client
    Get(ClientGetArgs),
    /// Delete a client
    Remove(ClientIdArgs),
}

#[derive(Args)]
pub struct ClientSetArgs {
    /// Client ID
    pub id: String,
    /// Client secret
    #[arg(long)]
    pub secret: String,
    /// Redirect domain
    #[arg(long, default_value = "")]
    pub domain: String,
    /// Owning user ID
    #[arg(long, default_value = "")]
    pub user_id: String,
}

#[derive(Args)]
pub struct ClientGetArgs {
    /// Client ID
    pub id: String,
    /// Print the secret instead of masking it
    #[arg(long)]
    pub show_secret: bool,
}

#[derive(Args)]
pub struct ClientIdArgs {
    /// Client ID
    pub id: String,
}

#[derive(Args)]
pub struct TokenArgs {
    #[command(subcommand)]
    pub command: TokenCommands,
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Show the token record holding a key
    Get(TokenKeyArgs),
    /// Delete the token record holding a key
    Remove(TokenKeyArgs),
}

#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct TokenKeyArgs {
    /// Authorization code
    #[arg(long)]
    pub code: Option<String>,
    /// Access token
    #[arg(long)]
    pub access: Option<String>,
    /// Refresh token
    #[arg(long)]
    pub refresh: Option<String>,
}

impl TokenKeyArgs {
    /// The index and key selected on the command line.
    pub fn key(&self) -> (TokenIndex, &str) {
        match (&self.code, &self.access, &self.refresh) {
            (Some(code), _, _) => (TokenIndex::Code, code),
            (_, Some(access), _) => (TokenIndex::Access, access),
            (_, _, Some(refresh)) => (TokenIndex::Refresh, refresh),
            // clap enforces exactly one of the three
            (None, None, None) => (TokenIndex::Code, ""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_token_key_selection() {
        let cli = Cli::try_parse_from(["oauth2-docstore", "token", "get", "--access", "a1"]).unwrap();
        let Commands::Token(TokenArgs {
            command: TokenCommands::Get(args),
        }) = cli.command
        else {
            panic!("expected token get");
        };
        assert_eq!(args.key(), (TokenIndex::Access, "a1"));
    }

    #[test]
    fn test_token_key_required_and_exclusive() {
        assert!(Cli::try_parse_from(["oauth2-docstore", "token", "remove"]).is_err());
        assert!(
            Cli::try_parse_from([
                "oauth2-docstore",
                "token",
                "remove",
                "--code",
                "c1",
                "--refresh",
                "r1"
            ])
            .is_err()
        );
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let cli = Cli::try_parse_from([
            "oauth2-docstore",
            "--url",
            "http://couch:5984",
            "--database",
            "auth",
            "--username",
            "admin",
            "ping",
        ])
        .unwrap();
        let mut config = AppConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.couchdb.url, "http://couch:5984");
        assert_eq!(config.couchdb.database, "auth");
        assert_eq!(config.couchdb.username.as_deref(), Some("admin"));
    }
}
