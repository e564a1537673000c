//! Configuration types for the CouchDB backend.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CouchError;

/// Configuration for a CouchDB session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CouchConfig {
    /// Server URL: `http://host:5984`. Must not embed credentials.
    pub url: String,

    /// User name for basic authentication.
    pub username: Option<String>,

    /// Password for basic authentication.
    pub password: Option<String>,

    /// Database holding client and token documents.
    pub database: String,

    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for CouchConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5984".into(),
            username: None,
            password: None,
            database: "oauth2".into(),
            request_timeout_ms: 10_000,
        }
    }
}

impl CouchConfig {
    /// Creates a new configuration with the given server URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the basic-auth credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sets the database name.
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_request_timeout_ms(mut self, timeout: u64) -> Self {
        self.request_timeout_ms = timeout;
        self
    }

    /// Parses and normalizes the server URL.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the URL is not an absolute
    /// `http`/`https` URL, carries credentials, a query or a fragment.
    pub fn base_url(&self) -> Result<Url, CouchError> {
        let url = Url::parse(self.url.trim())
            .map_err(|e| CouchError::config(format!("invalid url '{}': {e}", self.url)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(CouchError::config(format!(
                "unsupported url scheme '{}'",
                url.scheme()
            )));
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(CouchError::config(
                "credentials must be set through username/password, not the url",
            ));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(CouchError::config("url must not have a query or fragment"));
        }

        let mut normalized = url;
        let trimmed = normalized.path().trim_end_matches('/').to_string();
        normalized.set_path(&trimmed);
        Ok(normalized)
    }

    /// Validates the whole configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first invalid setting.
    pub fn validate(&self) -> Result<(), CouchError> {
        self.base_url()?;
        validate_database_name(&self.database)?;
        if self.password.is_some() && self.username.is_none() {
            return Err(CouchError::config("password is set without a username"));
        }
        if self.request_timeout_ms == 0 {
            return Err(CouchError::config("request_timeout_ms must be > 0"));
        }
        Ok(())
    }

    /// Server URL with the user name and a masked password, for logging.
    #[must_use]
    pub fn masked_url(&self) -> String {
        let Ok(mut url) = Url::parse(self.url.trim()) else {
            return self.url.clone();
        };
        if let Some(username) = &self.username {
            let _ = url.set_username(username);
            if self.password.is_some() {
                let _ = url.set_password(Some("****"));
            }
        }
        url.to_string()
    }
}

/// Checks a name against CouchDB's database naming rule.
pub(crate) fn validate_database_name(name: &str) -> Result<(), CouchError> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || "_$()+-/".contains(c)
        });
    if valid {
        Ok(())
    } else {
        Err(CouchError::config(format!(
            "invalid database name '{name}': must start with a lowercase letter and contain only a-z, 0-9, _$()+-/"
        )))
    }
}
