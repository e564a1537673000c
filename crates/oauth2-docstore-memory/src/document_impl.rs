//! Implementation of the DocumentStore trait for InMemoryDocumentStore.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use oauth2_docstore_storage::{
    DesignDocument, DocumentId, DocumentStore, Revision, StorageError, StoredDocument,
};

use crate::storage::{InMemoryDocumentStore, MemoryDocument};

/// Rejects bodies a document database would not accept.
fn validate_body(body: &Value) -> Result<(), StorageError> {
    match body.as_object() {
        Some(obj) if obj.keys().any(|k| k.starts_with('_')) => Err(
            StorageError::invalid_document("Top-level members starting with '_' are reserved"),
        ),
        Some(_) => Ok(()),
        None => Err(StorageError::invalid_document("Document body must be a JSON object")),
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, id: &DocumentId) -> Result<Option<StoredDocument>, StorageError> {
        self.ensure_open()?;
        let guard = self.documents.pin();
        Ok(guard.get(id).map(|doc| StoredDocument {
            id: id.clone(),
            revision: doc.revision.clone(),
            body: doc.body.clone(),
        }))
    }

    async fn get_revision(&self, id: &DocumentId) -> Result<Option<Revision>, StorageError> {
        self.ensure_open()?;
        let guard = self.documents.pin();
        Ok(guard.get(id).map(|doc| doc.revision.clone()))
    }

    async fn put(
        &self,
        id: &DocumentId,
        body: &Value,
        revision: Option<&Revision>,
    ) -> Result<Revision, StorageError> {
        self.ensure_open()?;
        validate_body(body)?;

        let _writer = self.lock_writes();
        let guard = self.documents.pin();
        let existing = guard.get(id);

        match (existing, revision) {
            (Some(current), Some(expected)) if &current.revision == expected => {}
            (None, None) => {}
            _ => return Err(StorageError::conflict(self.database.as_ref(), id.as_str())),
        }

        let next = Self::next_revision(existing.map(|doc| &doc.revision));
        let old_body = existing.map(|doc| doc.body.clone());
        guard.insert(
            id.clone(),
            MemoryDocument {
                revision: next.clone(),
                body: body.clone(),
            },
        );
        self.reindex(id, old_body.as_ref(), Some(body));

        debug!(database = %self.database, id = %id, rev = %next, "document written");
        Ok(next)
    }

    async fn create(&self, body: &Value) -> Result<(DocumentId, Revision), StorageError> {
        self.ensure_open()?;
        validate_body(body)?;

        let id = Self::generate_id();
        let revision = Self::next_revision(None);

        let _writer = self.lock_writes();
        let guard = self.documents.pin();
        if guard.get(&id).is_some() {
            return Err(StorageError::conflict(self.database.as_ref(), id.as_str()));
        }
        guard.insert(
            id.clone(),
            MemoryDocument {
                revision: revision.clone(),
                body: body.clone(),
            },
        );
        self.reindex(&id, None, Some(body));

        debug!(database = %self.database, id = %id, "document created");
        Ok((id, revision))
    }

    async fn delete(&self, id: &DocumentId, revision: &Revision) -> Result<Revision, StorageError> {
        self.ensure_open()?;

        let _writer = self.lock_writes();
        let guard = self.documents.pin();
        let current = guard
            .get(id)
            .ok_or_else(|| StorageError::not_found(self.database.as_ref(), id.as_str()))?;
        if &current.revision != revision {
            return Err(StorageError::conflict(self.database.as_ref(), id.as_str()));
        }

        let tombstone = Self::next_revision(Some(&current.revision));
        let old_body = current.body.clone();
        guard.remove(id);
        self.reindex(id, Some(&old_body), None);

        debug!(database = %self.database, id = %id, "document deleted");
        Ok(tombstone)
    }

    async fn query_view(
        &self,
        design: &str,
        view: &str,
        key: &str,
    ) -> Result<Vec<DocumentId>, StorageError> {
        self.ensure_open()?;

        let installed = {
            let designs = self.designs.pin();
            designs
                .get(design)
                .is_some_and(|d| d.view(view).is_some())
        };
        if !installed {
            return Err(StorageError::view_not_found(design, view));
        }

        let index_key = (design.to_string(), view.to_string(), key.to_string());
        Ok(self
            .indexes
            .get(&index_key)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn install_design(&self, design: &DesignDocument) -> Result<(), StorageError> {
        self.ensure_open()?;

        let _writer = self.lock_writes();
        {
            let designs = self.designs.pin();
            if designs.get(&design.name) == Some(design) {
                return Ok(());
            }
            designs.insert(design.name.clone(), design.clone());
        }
        self.rebuild_design(design);

        info!(
            database = %self.database,
            design = %design.name,
            views = design.views.len(),
            "design document installed"
        );
        Ok(())
    }

    async fn close(&self) {
        if self.mark_closed() {
            info!(database = %self.database, "in-memory session closed");
        }
    }

    fn is_closed(&self) -> bool {
        self.closed_flag()
    }

    fn database_name(&self) -> &str {
        &self.database
    }

    fn backend_name(&self) -> &'static str {
        "in-memory-papaya"
    }
}
