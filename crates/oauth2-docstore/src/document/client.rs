//! Client store over a document database.
//!
//! Each client is one document whose ID is the client ID.

use async_trait::async_trait;
use oauth2_docstore_storage::{DocumentId, DynDocumentStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::StoreResult;
use crate::error::StoreError;
use crate::storage::ClientStorage;
use crate::types::Client;

const ENTITY: &str = "client";

/// On-disk body of a client document.
#[derive(Debug, Serialize, Deserialize)]
struct ClientDocument {
    #[serde(default)]
    secret: String,
    #[serde(default)]
    domain: String,
    #[serde(default)]
    userid: String,
}

impl From<&Client> for ClientDocument {
    fn from(client: &Client) -> Self {
        Self {
            secret: client.secret.clone(),
            domain: client.domain.clone(),
            userid: client.user_id.clone(),
        }
    }
}

impl ClientDocument {
    fn into_client(self, id: &DocumentId) -> Client {
        Client {
            id: id.to_string(),
            secret: self.secret,
            domain: self.domain,
            user_id: self.userid,
        }
    }
}

/// [`ClientStorage`] backed by a shared document database handle.
#[derive(Clone)]
pub struct DocumentClientStore {
    store: DynDocumentStore,
}

impl DocumentClientStore {
    #[must_use]
    pub fn new(store: DynDocumentStore) -> Self {
        Self { store }
    }

    /// Maps an unusable ID to `NotFound` for lookups.
    fn lookup_id(id: &str) -> StoreResult<DocumentId> {
        Client::validate_id(id).map_err(|_| StoreError::not_found(ENTITY, id))?;
        Ok(DocumentId::new(id))
    }
}

#[async_trait]
impl ClientStorage for DocumentClientStore {
    #[instrument(skip_all, fields(client_id = %client.id))]
    async fn set(&self, client: &Client) -> StoreResult<()> {
        Client::validate_id(&client.id)?;
        let id = DocumentId::new(client.id.as_str());
        let body = serde_json::to_value(ClientDocument::from(client))?;

        // Creating is a single write; replacing needs the current revision.
        let revision = match self.store.put(&id, &body, None).await {
            Ok(revision) => revision,
            Err(e) if e.is_conflict() => {
                let current = self
                    .store
                    .get_revision(&id)
                    .await
                    .map_err(|e| StoreError::from_storage(ENTITY, e))?;
                self.store
                    .put(&id, &body, current.as_ref())
                    .await
                    .map_err(|e| StoreError::from_storage(ENTITY, e))?
            }
            Err(e) => return Err(StoreError::from_storage(ENTITY, e)),
        };

        debug!(rev = %revision, "client stored");
        Ok(())
    }

    #[instrument(skip_all, fields(client_id = %id))]
    async fn get_by_id(&self, id: &str) -> StoreResult<Client> {
        let doc_id = Self::lookup_id(id)?;
        let doc = self
            .store
            .get(&doc_id)
            .await
            .map_err(|e| StoreError::from_storage(ENTITY, e))?
            .ok_or_else(|| StoreError::not_found(ENTITY, id))?;

        let body: ClientDocument = serde_json::from_value(doc.body)?;
        Ok(body.into_client(&doc.id))
    }

    #[instrument(skip_all, fields(client_id = %id))]
    async fn remove_by_id(&self, id: &str) -> StoreResult<()> {
        let doc_id = Self::lookup_id(id)?;
        let revision = self
            .store
            .get_revision(&doc_id)
            .await
            .map_err(|e| StoreError::from_storage(ENTITY, e))?
            .ok_or_else(|| StoreError::not_found(ENTITY, id))?;

        self.store
            .delete(&doc_id, &revision)
            .await
            .map_err(|e| StoreError::from_storage(ENTITY, e))?;

        debug!("client removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_document_shape() {
        let client = Client::new("app-1", "s3cret", "https://app.example", "user-7");
        let body = serde_json::to_value(ClientDocument::from(&client)).unwrap();
        assert_eq!(
            body,
            json!({"secret": "s3cret", "domain": "https://app.example", "userid": "user-7"})
        );

        let doc: ClientDocument = serde_json::from_value(body).unwrap();
        assert_eq!(doc.into_client(&DocumentId::new("app-1")), client);
    }

    #[test]
    fn test_lookup_id_maps_invalid_to_not_found() {
        assert!(DocumentClientStore::lookup_id("").unwrap_err().is_not_found());
        assert!(
            DocumentClientStore::lookup_id("_design/x")
                .unwrap_err()
                .is_not_found()
        );
        assert!(DocumentClientStore::lookup_id("app-1").is_ok());
    }
}
