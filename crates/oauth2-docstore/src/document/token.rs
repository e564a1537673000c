//! Token store over a document database.
//!
//! Each token record is stored as `{"Payload": {...}}` under an ID the
//! database assigns. Lookups by code, access or refresh token go through the
//! views of the token design document; the store never writes index entries
//! itself.

use std::sync::Arc;

use async_trait::async_trait;
use oauth2_docstore_storage::{DesignDocument, DocumentId, DynDocumentStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::index::{self, TokenIndex};
use crate::StoreResult;
use crate::config::TokenConfig;
use crate::error::StoreError;
use crate::storage::TokenStorage;
use crate::types::TokenRecord;

const ENTITY: &str = "token";

#[derive(Serialize)]
struct NewTokenDocument<'a> {
    #[serde(rename = "Payload")]
    payload: &'a TokenRecord,
}

#[derive(Deserialize)]
struct TokenDocument {
    #[serde(rename = "Payload")]
    payload: TokenRecord,
}

/// [`TokenStorage`] backed by a shared document database handle.
#[derive(Clone)]
pub struct DocumentTokenStore {
    store: DynDocumentStore,
    design: Arc<DesignDocument>,
}

impl DocumentTokenStore {
    /// Creates a token store without touching the database.
    ///
    /// Lookups fail until the token views exist; see [`Self::open`].
    #[must_use]
    pub fn new(store: DynDocumentStore, config: &TokenConfig) -> Self {
        Self {
            store,
            design: Arc::new(index::token_design(&config.design_document)),
        }
    }

    /// Creates a token store and installs the token views.
    ///
    /// # Errors
    ///
    /// Returns an error if the design document cannot be installed.
    pub async fn open(store: DynDocumentStore, config: &TokenConfig) -> StoreResult<Self> {
        let tokens = Self::new(store, config);
        tokens.ensure_indexes().await?;
        Ok(tokens)
    }

    /// Installs the token design document if it is missing or outdated.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    #[instrument(skip_all, fields(design = %self.design.name))]
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        self.store.install_design(&self.design).await?;
        info!(database = self.store.database_name(), "token indexes ready");
        Ok(())
    }

    /// The design document holding the token views.
    #[must_use]
    pub fn design(&self) -> &DesignDocument {
        &self.design
    }

    /// Stores `record` and returns the ID the database assigned to it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRecord` if the record carries no token or a lifetime
    /// that cannot be stored, or an error if the storage operation fails.
    #[instrument(skip_all)]
    pub async fn create_document(&self, record: &TokenRecord) -> StoreResult<DocumentId> {
        if !record.has_any_token() {
            return Err(StoreError::invalid_record(
                "token record must carry a code, access token or refresh token",
            ));
        }

        let body = serde_json::to_value(NewTokenDocument { payload: record })
            .map_err(|e| StoreError::invalid_record(e.to_string()))?;
        let (id, revision) = self
            .store
            .create(&body)
            .await
            .map_err(|e| StoreError::from_storage(ENTITY, e))?;

        debug!(id = %id, rev = %revision, client_id = %record.client_id, "token stored");
        Ok(id)
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.store.is_closed() {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    #[instrument(skip_all, fields(index = %index))]
    async fn get_by(&self, index: TokenIndex, key: &str) -> StoreResult<Option<TokenRecord>> {
        self.ensure_open()?;
        if key.is_empty() {
            return Ok(None);
        }

        let Some(id) = index::resolve(self.store.as_ref(), &self.design.name, index, key).await?
        else {
            return Ok(None);
        };

        // The document can vanish between the view query and the read.
        let Some(doc) = self
            .store
            .get(&id)
            .await
            .map_err(|e| StoreError::from_storage(ENTITY, e))?
        else {
            return Ok(None);
        };

        let document: TokenDocument = serde_json::from_value(doc.body)?;
        Ok(Some(document.payload))
    }

    #[instrument(skip_all, fields(index = %index))]
    async fn remove_by(&self, index: TokenIndex, key: &str) -> StoreResult<()> {
        self.ensure_open()?;
        if key.is_empty() {
            return Ok(());
        }

        let Some(id) = index::resolve(self.store.as_ref(), &self.design.name, index, key).await?
        else {
            return Ok(());
        };

        let Some(revision) = self
            .store
            .get_revision(&id)
            .await
            .map_err(|e| StoreError::from_storage(ENTITY, e))?
        else {
            return Ok(());
        };

        match self.store.delete(&id, &revision).await {
            Ok(_) => {
                debug!(id = %id, "token removed");
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(StoreError::from_storage(ENTITY, e)),
        }
    }
}

#[async_trait]
impl TokenStorage for DocumentTokenStore {
    async fn create(&self, record: &TokenRecord) -> StoreResult<()> {
        self.create_document(record).await.map(|_| ())
    }

    async fn get_by_code(&self, code: &str) -> StoreResult<Option<TokenRecord>> {
        self.get_by(TokenIndex::Code, code).await
    }

    async fn get_by_access(&self, access: &str) -> StoreResult<Option<TokenRecord>> {
        self.get_by(TokenIndex::Access, access).await
    }

    async fn get_by_refresh(&self, refresh: &str) -> StoreResult<Option<TokenRecord>> {
        self.get_by(TokenIndex::Refresh, refresh).await
    }

    async fn remove_by_code(&self, code: &str) -> StoreResult<()> {
        self.remove_by(TokenIndex::Code, code).await
    }

    async fn remove_by_access(&self, access: &str) -> StoreResult<()> {
        self.remove_by(TokenIndex::Access, access).await
    }

    async fn remove_by_refresh(&self, refresh: &str) -> StoreResult<()> {
        self.remove_by(TokenIndex::Refresh, refresh).await
    }

    async fn close(&self) {
        self.store.close().await;
    }
}
