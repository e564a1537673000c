//! In-memory document backend for oauth2-docstore.
//!
//! This crate provides an in-memory implementation of the `DocumentStore`
//! trait from `oauth2-docstore-storage`, using papaya lock-free HashMap for
//! concurrent reads and a DashMap for the derived view indexes.
//!
//! It is the reference implementation of automatic secondary indexing: view
//! keys are recomputed from document content on every write, exactly as a
//! document database recomputes its views.
//!
//! # Example
//!
//! ```ignore
//! use oauth2_docstore_memory::InMemoryDocumentStore;
//! use oauth2_docstore_storage::DocumentStore;
//!
//! let store = InMemoryDocumentStore::new("oauth2");
//! let (id, rev) = store.create(&serde_json::json!({"Payload": {"Code": "c1"}})).await?;
//! ```

mod document_impl;
pub mod storage;

pub use oauth2_docstore_storage::{DocumentStore, StorageError, StoredDocument};
pub use storage::InMemoryDocumentStore;

/// Creates a new in-memory store wrapped for sharing.
pub fn create_document_store(database: impl Into<String>) -> oauth2_docstore_storage::DynDocumentStore {
    std::sync::Arc::new(InMemoryDocumentStore::new(database))
}
