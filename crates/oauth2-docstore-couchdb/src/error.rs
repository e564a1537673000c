//! Error types for the CouchDB backend.

use oauth2_docstore_storage::StorageError;
use reqwest::StatusCode;
use serde::Deserialize;

/// Errors specific to the CouchDB backend.
#[derive(Debug, thiserror::Error)]
pub enum CouchError {
    /// Invalid session configuration.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an unexpected status.
    #[error("CouchDB error (status {status}): {error}: {reason}")]
    Status {
        status: u16,
        error: String,
        reason: String,
    },
}

impl CouchError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a configuration error.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

impl From<CouchError> for StorageError {
    fn from(err: CouchError) -> Self {
        match err {
            CouchError::Config { message } => {
                StorageError::connection(format!("Configuration error: {message}"))
            }
            CouchError::Http(e) if e.is_timeout() => {
                StorageError::connection(format!("request timed out: {e}"))
            }
            CouchError::Http(e) => match e.status() {
                Some(status) => StorageError::backend(status.as_u16(), e.to_string()),
                None => StorageError::connection(e.to_string()),
            },
            CouchError::Status {
                status,
                error,
                reason,
            } => StorageError::backend(status, format!("{error}: {reason}")),
        }
    }
}

/// Error body CouchDB returns with non-success statuses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub reason: String,
}

impl ErrorBody {
    pub(crate) fn parse(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}

/// What a failed request was addressing, for mapping 404/409.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Target<'a> {
    Server,
    Document { database: &'a str, id: &'a str },
    View { design: &'a str, view: &'a str },
}

/// Maps a non-success response to a storage error.
pub(crate) fn status_error(target: Target<'_>, status: StatusCode, body: &[u8]) -> StorageError {
    let body = ErrorBody::parse(body);
    match (status, target) {
        (StatusCode::NOT_FOUND, Target::Document { database, id }) => {
            StorageError::not_found(database, id)
        }
        (StatusCode::NOT_FOUND, Target::View { design, view }) => {
            StorageError::view_not_found(design, view)
        }
        (StatusCode::CONFLICT, Target::Document { database, id }) => {
            StorageError::conflict(database, id)
        }
        (StatusCode::BAD_REQUEST, Target::Document { .. }) => {
            StorageError::invalid_document(format!("{}: {}", body.error, body.reason))
        }
        _ => CouchError::Status {
            status: status.as_u16(),
            error: body.error,
            reason: body.reason,
        }
        .into(),
    }
}
