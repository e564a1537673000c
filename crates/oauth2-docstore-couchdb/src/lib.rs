//! CouchDB document backend for oauth2-docstore.
//!
//! This crate implements the `DocumentStore` trait from
//! `oauth2-docstore-storage` over the CouchDB HTTP API:
//!
//! - documents are read with `GET`, their revision with `HEAD` + `ETag`
//! - writes and deletes carry the expected revision; CouchDB answers a stale
//!   one with `409 Conflict`
//! - view indexes are design documents with JavaScript map functions, kept
//!   up to date by CouchDB itself
//!
//! # Example
//!
//! ```ignore
//! use oauth2_docstore_couchdb::{CouchClient, CouchConfig};
//!
//! let config = CouchConfig::new("http://localhost:5984")
//!     .with_credentials("admin", "secret")
//!     .with_database("oauth2");
//! let client = CouchClient::connect(&config)?;
//! client.ensure_database(&config.database).await?;
//! let db = client.database(&config.database)?;
//! ```

mod client;
pub mod config;
mod database;
pub mod error;

pub use client::CouchClient;
pub use config::CouchConfig;
pub use database::CouchDatabase;
pub use error::CouchError;

use std::sync::Arc;

use oauth2_docstore_storage::DynDocumentStore;

/// Connects and returns a shared handle to the configured database.
///
/// # Errors
///
/// Returns an error if the configuration is invalid.
pub fn create_document_store(config: &CouchConfig) -> Result<DynDocumentStore, CouchError> {
    let client = CouchClient::connect(config)?;
    Ok(Arc::new(client.database(&config.database)?))
}
