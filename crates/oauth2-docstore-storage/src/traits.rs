//! Storage traits for the document database abstraction layer.
//!
//! This module defines the capability set every document backend must offer.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageError;
use crate::types::{DesignDocument, DocumentId, Revision, StoredDocument};

/// A handle on one database of a document-oriented backend.
///
/// Implementations must be thread-safe (`Send + Sync`): a single handle is
/// shared by every store built on top of it. Each method is one round trip;
/// dropping the returned future abandons the request. Implementations never
/// retry.
///
/// # Example
///
/// ```ignore
/// use oauth2_docstore_storage::{DocumentStore, StorageError, StoredDocument};
///
/// async fn load(store: &dyn DocumentStore, id: &str) -> Result<StoredDocument, StorageError> {
///     store
///         .get(&id.into())
///         .await?
///         .ok_or_else(|| StorageError::not_found(store.database_name(), id))
/// }
/// ```
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // ==================== Point Operations ====================

    /// Reads a document by ID.
    ///
    /// Returns `None` if the document does not exist or has been deleted.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing documents.
    async fn get(&self, id: &DocumentId) -> Result<Option<StoredDocument>, StorageError>;

    /// Reads only the current revision of a document.
    ///
    /// Returns `None` if the document does not exist.
    async fn get_revision(&self, id: &DocumentId) -> Result<Option<Revision>, StorageError>;

    /// Writes a document under a caller-chosen ID.
    ///
    /// `revision` must be the current revision when the document already
    /// exists and `None` when it does not.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the supplied revision is not current.
    async fn put(
        &self,
        id: &DocumentId,
        body: &Value,
        revision: Option<&Revision>,
    ) -> Result<Revision, StorageError>;

    /// Creates a document under an ID assigned by the backend.
    async fn create(&self, body: &Value) -> Result<(DocumentId, Revision), StorageError>;

    /// Deletes a document, conditioned on its current revision.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the document does not exist.
    /// Returns `StorageError::Conflict` if `revision` is stale.
    async fn delete(&self, id: &DocumentId, revision: &Revision) -> Result<Revision, StorageError>;

    // ==================== Views ====================

    /// Returns the IDs of documents whose view key equals `key` exactly.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ViewNotFound` if the view is not installed.
    async fn query_view(
        &self,
        design: &str,
        view: &str,
        key: &str,
    ) -> Result<Vec<DocumentId>, StorageError>;

    /// Like [`Self::query_view`], returning at most `limit` IDs.
    ///
    /// Backends that can bound the query server-side should override this.
    async fn query_view_limited(
        &self,
        design: &str,
        view: &str,
        key: &str,
        limit: usize,
    ) -> Result<Vec<DocumentId>, StorageError> {
        let mut ids = self.query_view(design, view, key).await?;
        ids.truncate(limit);
        Ok(ids)
    }

    /// Installs (or replaces) a design document. Idempotent.
    async fn install_design(&self, design: &DesignDocument) -> Result<(), StorageError>;

    // ==================== Lifecycle ====================

    /// Releases the underlying session.
    ///
    /// Idempotent. Every later call on this handle, or on any handle sharing
    /// its session, fails with `StorageError::Closed`.
    async fn close(&self);

    /// Returns whether the session has been closed.
    fn is_closed(&self) -> bool;

    // ==================== Metadata ====================

    /// Returns the name of the database this handle operates on.
    fn database_name(&self) -> &str;

    /// Returns the name of this storage backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}
