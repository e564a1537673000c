//! # oauth2-docstore-storage
//!
//! Document database abstraction layer for oauth2-docstore.
//!
//! This crate defines the capability set a document backend must provide to
//! host the OAuth2 client and token stores. It does not contain any
//! implementations; those live in `oauth2-docstore-memory` and
//! `oauth2-docstore-couchdb`.
//!
//! ## Overview
//!
//! The main trait is [`DocumentStore`], which covers:
//! - point get / put / delete guarded by a revision tag
//! - creation under a backend-assigned ID
//! - exact-key queries against named views
//! - design-document installation
//!
//! ## Storage Backends
//!
//! ```ignore
//! use async_trait::async_trait;
//! use oauth2_docstore_storage::{DocumentStore, StorageError, StoredDocument};
//!
//! struct MyBackend {
//!     // ...
//! }
//!
//! #[async_trait]
//! impl DocumentStore for MyBackend {
//!     async fn get(&self, id: &DocumentId) -> Result<Option<StoredDocument>, StorageError> {
//!         // Implementation
//!     }
//!     // ... other methods
//! }
//! ```

mod error;
mod traits;
mod types;

pub use error::{ErrorCategory, StorageError};
pub use traits::DocumentStore;
pub use types::{DesignDocument, DocumentId, Revision, StoredDocument, ViewDefinition};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a shared document store handle.
pub type DynDocumentStore = std::sync::Arc<dyn DocumentStore>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use oauth2_docstore_storage::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ErrorCategory, StorageError};
    pub use crate::traits::DocumentStore;
    pub use crate::types::{DesignDocument, DocumentId, Revision, StoredDocument, ViewDefinition};
    pub use crate::{DynDocumentStore, StorageResult};
}
