//! Storage error types for the document database abstraction layer.
//!
//! This module defines all error types that a document backend can report.

use std::fmt;

/// Errors that can occur during document storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested document does not exist (or has been deleted).
    #[error("Document not found: {database}/{id}")]
    NotFound {
        /// The database that was queried.
        database: String,
        /// The ID of the document that was not found.
        id: String,
    },

    /// A revision-guarded write lost against a concurrent mutation.
    #[error("Document update conflict: {database}/{id}")]
    Conflict {
        /// The database that rejected the write.
        database: String,
        /// The ID of the contended document.
        id: String,
    },

    /// The requested view (or its design document) is not installed.
    #[error("View not found: _design/{design}/_view/{view}")]
    ViewNotFound {
        /// The design document name.
        design: String,
        /// The view name.
        view: String,
    },

    /// The backend could not be reached.
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the transport failure.
        message: String,
    },

    /// The backend answered with an unexpected status.
    #[error("Backend error (status {status}): {message}")]
    Backend {
        /// Status code reported by the backend.
        status: u16,
        /// Body or reason reported by the backend.
        message: String,
    },

    /// A document body could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The document body is not acceptable to the backend.
    #[error("Invalid document: {message}")]
    InvalidDocument {
        /// Description of why the document is invalid.
        message: String,
    },

    /// The session was closed before the operation started.
    #[error("Storage session is closed")]
    Closed,
}

impl StorageError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(database: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            database: database.into(),
            id: id.into(),
        }
    }

    /// Creates a new `Conflict` error.
    #[must_use]
    pub fn conflict(database: impl Into<String>, id: impl Into<String>) -> Self {
        Self::Conflict {
            database: database.into(),
            id: id.into(),
        }
    }

    /// Creates a new `ViewNotFound` error.
    #[must_use]
    pub fn view_not_found(design: impl Into<String>, view: impl Into<String>) -> Self {
        Self::ViewNotFound {
            design: design.into(),
            view: view.into(),
        }
    }

    /// Creates a new `Connection` error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a new `Backend` error.
    #[must_use]
    pub fn backend(status: u16, message: impl Into<String>) -> Self {
        Self::Backend {
            status,
            message: message.into(),
        }
    }

    /// Creates a new `InvalidDocument` error.
    #[must_use]
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is a revision conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns `true` if the session was already closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } | Self::ViewNotFound { .. } => ErrorCategory::NotFound,
            Self::Conflict { .. } => ErrorCategory::Conflict,
            Self::Connection { .. } | Self::Closed => ErrorCategory::Infrastructure,
            Self::Backend { .. } => ErrorCategory::Backend,
            Self::Serialization(_) | Self::InvalidDocument { .. } => ErrorCategory::Validation,
        }
    }
}

/// Categories of storage errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Document or view not found.
    NotFound,
    /// Revision conflict.
    Conflict,
    /// Encoding or validation error.
    Validation,
    /// Transport or session error.
    Infrastructure,
    /// Unexpected backend response.
    Backend,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Validation => write!(f, "validation"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Backend => write!(f, "backend"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::not_found("oauth2", "abc");
        assert_eq!(err.to_string(), "Document not found: oauth2/abc");

        let err = StorageError::conflict("oauth2", "abc");
        assert_eq!(err.to_string(), "Document update conflict: oauth2/abc");

        let err = StorageError::view_not_found("token_views", "by_code");
        assert_eq!(
            err.to_string(),
            "View not found: _design/token_views/_view/by_code"
        );

        assert_eq!(StorageError::Closed.to_string(), "Storage session is closed");
    }

    #[test]
    fn test_error_predicates() {
        let err = StorageError::not_found("oauth2", "abc");
        assert!(err.is_not_found());
        assert!(!err.is_conflict());
        assert!(!err.is_closed());

        let err = StorageError::conflict("oauth2", "abc");
        assert!(err.is_conflict());
        assert!(!err.is_not_found());

        assert!(StorageError::Closed.is_closed());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            StorageError::not_found("db", "1").category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            StorageError::view_not_found("d", "v").category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            StorageError::conflict("db", "1").category(),
            ErrorCategory::Conflict
        );
        assert_eq!(
            StorageError::backend(500, "boom").category(),
            ErrorCategory::Backend
        );
        assert_eq!(StorageError::Closed.category(), ErrorCategory::Infrastructure);
        assert_eq!(ErrorCategory::Infrastructure.to_string(), "infrastructure");
    }
}
