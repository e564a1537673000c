//! Store error types.
//!
//! Every failure of a client or token store is reported as a [`StoreError`].
//! The variants are distinct enough for the protocol engine to tell an
//! expected outcome (a missing client, a lost race) from a fault.

use std::fmt;

use oauth2_docstore_storage::StorageError;

use crate::document::TokenIndex;

/// Errors that can occur during client and token store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record that was looked up.
        entity: String,
        /// Primary key that was looked up.
        id: String,
    },

    /// A secondary index resolved one key to several live documents.
    #[error("Multiple token documents exist for the same {index} (at least {matches} matches)")]
    Consistency {
        /// The index that produced the ambiguous result.
        index: TokenIndex,
        /// Lower bound on the number of documents the key resolved to.
        matches: usize,
    },

    /// A revision-guarded write or delete lost against a concurrent mutation.
    #[error("Conflicting update of {entity} {id}")]
    Conflict {
        /// Kind of record that was contended.
        entity: String,
        /// Primary key of the contended record.
        id: String,
    },

    /// The database or the transport to it failed.
    #[error("Persistence error: {source}")]
    Persistence {
        /// The backend error.
        #[source]
        source: StorageError,
    },

    /// The store was used after `close`.
    #[error("Store is closed")]
    Closed,

    /// The record handed to the store violates a record invariant.
    #[error("Invalid record: {message}")]
    InvalidRecord {
        /// Description of the violated invariant.
        message: String,
    },
}

impl StoreError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a new `Consistency` error.
    #[must_use]
    pub fn consistency(index: TokenIndex, matches: usize) -> Self {
        Self::Consistency { index, matches }
    }

    /// Creates a new `Conflict` error.
    #[must_use]
    pub fn conflict(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::Conflict {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a new `InvalidRecord` error.
    #[must_use]
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }

    /// Converts a backend error, naming the record kind for not-found and
    /// conflict cases.
    #[must_use]
    pub fn from_storage(entity: &str, err: StorageError) -> Self {
        match err {
            StorageError::NotFound { id, .. } => Self::not_found(entity, id),
            StorageError::Conflict { id, .. } => Self::conflict(entity, id),
            StorageError::Closed => Self::Closed,
            source => Self::Persistence { source },
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is a consistency error.
    #[must_use]
    pub fn is_consistency_error(&self) -> bool {
        matches!(self, Self::Consistency { .. })
    }

    /// Returns `true` if this is a revision conflict.
    ///
    /// On token removal a conflict means another caller revoked the same
    /// document first.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns `true` if this is a persistence error.
    #[must_use]
    pub fn is_persistence_error(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }

    /// Returns `true` if the store was closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns `true` if the caller supplied an invalid record.
    #[must_use]
    pub fn is_invalid_record(&self) -> bool {
        matches!(self, Self::InvalidRecord { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Consistency { .. } => ErrorCategory::Consistency,
            Self::Conflict { .. } => ErrorCategory::Conflict,
            Self::Persistence { .. } | Self::Closed => ErrorCategory::Infrastructure,
            Self::InvalidRecord { .. } => ErrorCategory::Validation,
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        Self::from_storage("document", err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Persistence {
            source: StorageError::from(err),
        }
    }
}

/// Categories of store errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Record absent.
    NotFound,
    /// Index uniqueness violated.
    Consistency,
    /// Lost a revision race.
    Conflict,
    /// Invalid caller input.
    Validation,
    /// Backend, transport or session failure.
    Infrastructure,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Consistency => write!(f, "consistency"),
            Self::Conflict => write!(f, "conflict"),
            Self::Validation => write!(f, "validation"),
            Self::Infrastructure => write!(f, "infrastructure"),
        }
    }
}
