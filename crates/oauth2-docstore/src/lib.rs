//! OAuth 2.0 client and token persistence over a document database.
//!
//! Provides persistent storage for:
//!
//! - OAuth clients, one document per client keyed by client ID
//! - Token records, one document per grant holding the authorization code,
//!   access token and refresh token together
//!
//! Token records are found through three database-maintained views
//! (`by_code`, `by_access`, `by_refresh`). Removing a record through any of
//! its keys deletes the whole document.
//!
//! Any backend implementing [`DocumentStore`] can host the stores; the
//! workspace ships an in-memory backend and a CouchDB backend.
//!
//! # Example
//!
//! ```ignore
//! use oauth2_docstore::{AuthStorage, ClientStorage, TokenStorage};
//!
//! let storage = AuthStorage::open(store).await?;
//!
//! let client = storage.clients().get_by_id("my-app").await?;
//! let token = storage.tokens().get_by_access(&access).await?;
//! ```
//!
//! [`DocumentStore`]: oauth2_docstore_storage::DocumentStore

pub mod config;
pub mod document;
pub mod error;
pub mod storage;
pub mod types;

use oauth2_docstore_storage::DynDocumentStore;

pub use config::TokenConfig;
pub use document::{DocumentClientStore, DocumentTokenStore, TokenIndex};
pub use error::{ErrorCategory, StoreError};
pub use storage::{ClientStorage, TokenStorage};
pub use types::{Client, TokenRecord};

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Storage Façade
// =============================================================================

/// Client and token stores sharing one database handle.
///
/// Cloning is cheap; clones share the handle and its session.
#[derive(Clone)]
pub struct AuthStorage {
    store: DynDocumentStore,
    clients: DocumentClientStore,
    tokens: DocumentTokenStore,
}

impl AuthStorage {
    /// Create storage over an existing handle without installing views.
    #[must_use]
    pub fn new(store: DynDocumentStore) -> Self {
        Self::with_token_config(store, &TokenConfig::default())
    }

    /// Like [`Self::new`], with custom token settings.
    #[must_use]
    pub fn with_token_config(store: DynDocumentStore, config: &TokenConfig) -> Self {
        Self {
            clients: DocumentClientStore::new(store.clone()),
            tokens: DocumentTokenStore::new(store.clone(), config),
            store,
        }
    }

    /// Create storage and install the token views.
    ///
    /// # Errors
    ///
    /// Returns an error if the views cannot be installed.
    pub async fn open(store: DynDocumentStore) -> StoreResult<Self> {
        Self::open_with_token_config(store, &TokenConfig::default()).await
    }

    /// Like [`Self::open`], with custom token settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the views cannot be installed.
    pub async fn open_with_token_config(
        store: DynDocumentStore,
        config: &TokenConfig,
    ) -> StoreResult<Self> {
        let storage = Self::with_token_config(store, config);
        storage.tokens.ensure_indexes().await?;
        Ok(storage)
    }

    // -------------------------------------------------------------------------
    // Storage Accessors
    // -------------------------------------------------------------------------

    /// Get client storage operations.
    #[must_use]
    pub fn clients(&self) -> &DocumentClientStore {
        &self.clients
    }

    /// Get token storage operations.
    #[must_use]
    pub fn tokens(&self) -> &DocumentTokenStore {
        &self.tokens
    }

    /// Get the underlying database handle.
    #[must_use]
    pub fn store(&self) -> &DynDocumentStore {
        &self.store
    }

    /// Close the shared session. Both stores fail with `Closed` afterwards.
    pub async fn close(&self) {
        self.store.close().await;
    }
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::TokenConfig;
    pub use crate::document::{DocumentClientStore, DocumentTokenStore, TokenIndex};
    pub use crate::error::{ErrorCategory, StoreError};
    pub use crate::storage::{ClientStorage, TokenStorage};
    pub use crate::types::{Client, TokenRecord};
    pub use crate::{AuthStorage, StoreResult};
}
