use std::path::Path;

use oauth2_docstore::TokenConfig;
use oauth2_docstore_couchdb::CouchConfig;
use serde::{Deserialize, Serialize};

/// Prefix of environment overrides, e.g. `OAUTH2_DOCSTORE__COUCHDB__URL`.
pub const ENV_PREFIX: &str = "OAUTH2_DOCSTORE";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub couchdb: CouchConfig,
    #[serde(default)]
    pub token: TokenConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "oauth2_docstore=info".into()
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.couchdb
            .validate()
            .map_err(|e| format!("couchdb: {e}"))?;
        self.token.validate()?;
        if self.logging.level.trim().is_empty() {
            return Err("logging.level must not be empty".into());
        }
        Ok(())
    }

    /// Copy of the configuration safe to print.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.couchdb.password.is_some() {
            copy.couchdb.password = Some("****".into());
        }
        copy
    }
}

pub fn load_config(path: &Path) -> Result<AppConfig, String> {
    load_config_with_env(path, None)
}

/// Loads `path` (if it exists) and layers environment overrides on top.
///
/// `env` replaces the process environment when given.
pub fn load_config_with_env(
    path: &Path,
    env: Option<config::Map<String, String>>,
) -> Result<AppConfig, String> {
    use config::{Config, Environment, File};

    let mut builder = Config::builder();
    if path.exists() {
        builder = builder.add_source(File::from(path));
    }
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .separator("__")
            .source(env),
    );

    let cfg = builder
        .build()
        .map_err(|e| format!("config build error: {e}"))?;
    cfg.try_deserialize()
        .map_err(|e| format!("config deserialize error: {e}"))
}
