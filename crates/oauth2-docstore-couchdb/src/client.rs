//! CouchDB session management.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use oauth2_docstore_storage::StorageError;
use reqwest::header::ACCEPT;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::{CouchConfig, validate_database_name};
use crate::database::CouchDatabase;
use crate::error::{CouchError, Target, status_error};

/// State shared by a client and every database handle it hands out.
pub(crate) struct Session {
    http: reqwest::Client,
    base_url: Url,
    credentials: Option<(String, Option<String>)>,
    closed: AtomicBool,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.credentials.as_ref().map(|(user, _)| user))
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Builds the URL `<base>/<segments...>`, percent-encoding each segment.
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url, StorageError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StorageError::connection("server url cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let req = self
            .http
            .request(method, url)
            .header(ACCEPT, "application/json");
        match &self.credentials {
            Some((username, password)) => req.basic_auth(username, password.as_deref()),
            None => req,
        }
    }

    /// Sends a request unless the session is closed.
    pub(crate) async fn send(&self, req: RequestBuilder) -> Result<Response, StorageError> {
        self.ensure_open()?;
        Ok(req.send().await.map_err(CouchError::from)?)
    }

    pub(crate) fn ensure_open(&self) -> Result<(), StorageError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::Closed);
        }
        Ok(())
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Marks the session closed; returns `true` on the first call.
    pub(crate) fn mark_closed(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }
}

/// Reads a response body, mapping non-success statuses to errors.
pub(crate) async fn read_body(
    response: Response,
    target: Target<'_>,
) -> Result<Vec<u8>, StorageError> {
    let status = response.status();
    let body = response.bytes().await.map_err(CouchError::from)?;
    if status.is_success() {
        Ok(body.to_vec())
    } else {
        Err(status_error(target, status, &body))
    }
}

#[derive(Debug, Deserialize)]
struct Welcome {
    #[serde(default)]
    version: String,
}

/// A session with one CouchDB server.
///
/// The session is created once and shared: cloning the client or opening
/// database handles reuses the same HTTP connection pool and credentials.
#[derive(Debug, Clone)]
pub struct CouchClient {
    session: Arc<Session>,
}

impl CouchClient {
    /// Creates a session from a validated configuration.
    ///
    /// No request is made; use [`Self::ping`] to check reachability.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    #[instrument(skip(config), fields(url = %config.masked_url()))]
    pub fn connect(config: &CouchConfig) -> Result<Self, CouchError> {
        config.validate()?;
        let base_url = config.base_url()?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        info!(
            request_timeout_ms = config.request_timeout_ms,
            "CouchDB session created"
        );

        Ok(Self {
            session: Arc::new(Session {
                http,
                base_url,
                credentials: config
                    .username
                    .clone()
                    .map(|user| (user, config.password.clone())),
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Returns a handle to a database on this server.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `name` is not a valid database name.
    pub fn database(&self, name: &str) -> Result<CouchDatabase, CouchError> {
        validate_database_name(name)?;
        Ok(CouchDatabase::new(Arc::clone(&self.session), name))
    }

    /// Checks that the server answers and returns its version.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is unreachable or rejects the request.
    #[instrument(skip(self))]
    pub async fn ping(&self) -> Result<String, StorageError> {
        let url = self.session.url(&[])?;
        let response = self
            .session
            .send(self.session.request(Method::GET, url))
            .await?;
        let body = read_body(response, Target::Server).await?;
        let welcome: Welcome = serde_json::from_slice(&body)?;
        debug!(version = %welcome.version, "CouchDB reachable");
        Ok(welcome.version)
    }

    /// Creates a database if it does not exist yet.
    ///
    /// Returns `true` if the database was created by this call.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or the server refuses.
    #[instrument(skip(self))]
    pub async fn ensure_database(&self, name: &str) -> Result<bool, StorageError> {
        validate_database_name(name)?;
        let url = self.session.url(&[name])?;
        let response = self
            .session
            .send(self.session.request(Method::PUT, url))
            .await?;

        match response.status() {
            StatusCode::PRECONDITION_FAILED => {
                debug!(database = %name, "database already exists");
                Ok(false)
            }
            _ => {
                read_body(response, Target::Server).await?;
                info!(database = %name, "database created");
                Ok(true)
            }
        }
    }

    /// Closes the session for every handle sharing it. Idempotent.
    pub fn close(&self) {
        if self.session.mark_closed() {
            info!("CouchDB session closed");
        }
    }

    /// Returns `true` once the session is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }
}
