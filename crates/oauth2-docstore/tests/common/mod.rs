//! Document store wrapper that injects the outcomes of concurrent writers.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use oauth2_docstore_memory::InMemoryDocumentStore;
use oauth2_docstore_storage::{
    DesignDocument, DocumentId, DocumentStore, Revision, StorageError, StoredDocument,
};
use serde_json::Value;

/// What another writer did between two round trips of the store under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum Race {
    /// The document is gone by the time its revision is read.
    RevisionGone,
    /// The document is gone by the time it is read.
    DocumentGone,
    /// The delete finds the document already deleted.
    DeleteNotFound,
    /// The delete finds the document rewritten.
    DeleteConflict,
    /// Every put loses against a concurrent write.
    PutConflict,
}

pub struct RacingStore {
    inner: Arc<InMemoryDocumentStore>,
    race: Mutex<Option<Race>>,
}

#[allow(dead_code)]
impl RacingStore {
    pub fn new(inner: Arc<InMemoryDocumentStore>) -> Self {
        Self {
            inner,
            race: Mutex::new(None),
        }
    }

    pub fn set_race(&self, race: Race) {
        *self.race.lock().unwrap() = Some(race);
    }

    fn is(&self, race: Race) -> bool {
        *self.race.lock().unwrap() == Some(race)
    }
}

#[async_trait]
impl DocumentStore for RacingStore {
    async fn get(&self, id: &DocumentId) -> Result<Option<StoredDocument>, StorageError> {
        if self.is(Race::DocumentGone) {
            return Ok(None);
        }
        self.inner.get(id).await
    }

    async fn get_revision(&self, id: &DocumentId) -> Result<Option<Revision>, StorageError> {
        if self.is(Race::RevisionGone) {
            return Ok(None);
        }
        self.inner.get_revision(id).await
    }

    async fn put(
        &self,
        id: &DocumentId,
        body: &Value,
        revision: Option<&Revision>,
    ) -> Result<Revision, StorageError> {
        if self.is(Race::PutConflict) {
            return Err(StorageError::conflict(self.inner.database_name(), id.as_str()));
        }
        self.inner.put(id, body, revision).await
    }

    async fn create(&self, body: &Value) -> Result<(DocumentId, Revision), StorageError> {
        self.inner.create(body).await
    }

    async fn delete(&self, id: &DocumentId, revision: &Revision) -> Result<Revision, StorageError> {
        let database = self.inner.database_name();
        if self.is(Race::DeleteNotFound) {
            return Err(StorageError::not_found(database, id.as_str()));
        }
        if self.is(Race::DeleteConflict) {
            return Err(StorageError::conflict(database, id.as_str()));
        }
        self.inner.delete(id, revision).await
    }

    async fn query_view(
        &self,
        design: &str,
        view: &str,
        key: &str,
    ) -> Result<Vec<DocumentId>, StorageError> {
        self.inner.query_view(design, view, key).await
    }

    async fn install_design(&self, design: &DesignDocument) -> Result<(), StorageError> {
        self.inner.install_design(design).await
    }

    async fn close(&self) {
        self.inner.close().await;
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    fn database_name(&self) -> &str {
        self.inner.database_name()
    }

    fn backend_name(&self) -> &'static str {
        "racing"
    }
}
