use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use oauth2_docstore_storage::{DesignDocument, DocumentId, Revision, StorageError};
use papaya::HashMap as PapayaHashMap;
use serde_json::Value;
use uuid::Uuid;

/// Key of one index entry: design name, view name, emitted key.
pub(crate) type IndexKey = (String, String, String);

/// A live document held by the in-memory backend.
#[derive(Debug, Clone)]
pub(crate) struct MemoryDocument {
    pub(crate) revision: Revision,
    pub(crate) body: Value,
}

/// In-memory document backend using papaya lock-free HashMap.
///
/// This backend provides:
/// - Lock-free concurrent reads via papaya::HashMap
/// - Revision-guarded writes with CouchDB-style `N-hex` revisions
/// - View indexes recomputed on every write, never written by callers
///
/// Writers are serialized so that a document and its index entries always
/// change together. Clones share the same data and session.
#[derive(Debug, Clone)]
pub struct InMemoryDocumentStore {
    pub(crate) database: Arc<str>,
    /// Documents keyed by ID
    pub(crate) documents: Arc<PapayaHashMap<DocumentId, MemoryDocument>>,
    /// Installed design documents keyed by design name
    pub(crate) designs: Arc<PapayaHashMap<String, DesignDocument>>,
    /// Derived view indexes: (design, view, key) -> matching document IDs
    pub(crate) indexes: Arc<DashMap<IndexKey, BTreeSet<DocumentId>>>,
    write_lock: Arc<Mutex<()>>,
    closed: Arc<AtomicBool>,
}

impl InMemoryDocumentStore {
    /// Creates an empty database with the given name.
    pub fn new(database: impl Into<String>) -> Self {
        let database: String = database.into();
        Self {
            database: Arc::from(database),
            documents: Arc::new(PapayaHashMap::new()),
            designs: Arc::new(PapayaHashMap::new()),
            indexes: Arc::new(DashMap::new()),
            write_lock: Arc::new(Mutex::new(())),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Number of live documents, design documents excluded.
    pub fn document_count(&self) -> usize {
        self.documents.pin().len()
    }

    pub(crate) fn ensure_open(&self) -> Result<(), StorageError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::Closed);
        }
        Ok(())
    }

    pub(crate) fn mark_closed(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn closed_flag(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub(crate) fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Produces the revision following `previous`.
    pub(crate) fn next_revision(previous: Option<&Revision>) -> Revision {
        let generation = previous.and_then(Revision::generation).unwrap_or(0) + 1;
        Revision::new(format!("{generation}-{}", Uuid::new_v4().simple()))
    }

    /// Generates a fresh document ID in the CouchDB UUID style.
    pub(crate) fn generate_id() -> DocumentId {
        DocumentId::new(Uuid::new_v4().simple().to_string())
    }

    /// Collects every index key `body` emits across all installed designs.
    fn emitted_keys(&self, body: &Value) -> Vec<IndexKey> {
        let designs = self.designs.pin();
        let keys = designs
            .iter()
            .flat_map(|(name, design)| {
                design.views.iter().filter_map(move |view| {
                    view.extract_key(body)
                        .map(|key| (name.clone(), view.name.clone(), key.to_string()))
                })
            })
            .collect();
        keys
    }

    /// Moves `id`'s index entries from `old` to `new`. Call with the write lock held.
    pub(crate) fn reindex(&self, id: &DocumentId, old: Option<&Value>, new: Option<&Value>) {
        if let Some(old) = old {
            for key in self.emitted_keys(old) {
                self.indexes.remove_if_mut(&key, |_, ids| {
                    ids.remove(id);
                    ids.is_empty()
                });
            }
        }
        if let Some(new) = new {
            for key in self.emitted_keys(new) {
                self.indexes.entry(key).or_default().insert(id.clone());
            }
        }
    }

    /// Recomputes every entry of `design` from the current documents.
    /// Call with the write lock held.
    pub(crate) fn rebuild_design(&self, design: &DesignDocument) {
        self.indexes.retain(|(name, _, _), _| name != &design.name);

        let documents = self.documents.pin();
        for (id, doc) in documents.iter() {
            for view in &design.views {
                if let Some(key) = view.extract_key(&doc.body) {
                    self.indexes
                        .entry((design.name.clone(), view.name.clone(), key.to_string()))
                        .or_default()
                        .insert(id.clone());
                }
            }
        }
    }
}
