//! Document, revision and view types shared by all backends.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque primary identifier of a stored document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Wraps an identifier assigned by a backend.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Concurrency-control tag of a document.
///
/// Revisions follow the CouchDB `N-hash` shape, where `N` is the number of
/// times the document has been written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    #[must_use]
    pub fn new(rev: impl Into<String>) -> Self {
        Self(rev.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the write generation encoded in the revision, if any.
    #[must_use]
    pub fn generation(&self) -> Option<u64> {
        self.0.split_once('-').and_then(|(n, _)| n.parse().ok())
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document as read back from a backend.
///
/// `body` never contains the reserved `_id` / `_rev` members; they are lifted
/// into `id` and `revision`.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: DocumentId,
    pub revision: Revision,
    pub body: Value,
}

impl StoredDocument {
    /// Builds a stored document, stripping reserved members from `body`.
    #[must_use]
    pub fn new(id: DocumentId, revision: Revision, mut body: Value) -> Self {
        if let Some(obj) = body.as_object_mut() {
            obj.remove("_id");
            obj.remove("_rev");
        }
        Self { id, revision, body }
    }

    /// Returns a top-level member of the body.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.body.get(name)
    }
}

/// A secondary index over a string member of each document.
///
/// A view emits `key_path`'s value as its key when the value is a non-empty
/// string; documents without it are not indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDefinition {
    pub name: String,
    pub key_path: Vec<String>,
}

impl ViewDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>, key_path: &[&str]) -> Self {
        Self {
            name: name.into(),
            key_path: key_path.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Extracts the key this view emits for `body`, if any.
    #[must_use]
    pub fn extract_key<'a>(&self, body: &'a Value) -> Option<&'a str> {
        let mut current = body;
        for segment in &self.key_path {
            current = current.get(segment)?;
        }
        current.as_str().filter(|s| !s.is_empty())
    }

    /// Renders the view as a CouchDB JavaScript map function.
    #[must_use]
    pub fn map_function(&self) -> String {
        let mut guards = Vec::with_capacity(self.key_path.len());
        let mut accessor = String::from("doc");
        for segment in &self.key_path {
            accessor.push('.');
            accessor.push_str(segment);
            guards.push(accessor.clone());
        }
        format!(
            "function (doc) {{ if ({}) {{ emit({}, null); }} }}",
            guards.join(" && "),
            accessor
        )
    }
}

/// A named group of views, installed atomically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignDocument {
    pub name: String,
    pub views: Vec<ViewDefinition>,
}

impl DesignDocument {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            views: Vec::new(),
        }
    }

    /// Adds a view definition.
    #[must_use]
    pub fn with_view(mut self, view: ViewDefinition) -> Self {
        self.views.push(view);
        self
    }

    /// Looks up a view by name.
    #[must_use]
    pub fn view(&self, name: &str) -> Option<&ViewDefinition> {
        self.views.iter().find(|v| v.name == name)
    }

    /// The reserved document ID under which the design is stored.
    #[must_use]
    pub fn document_id(&self) -> String {
        format!("_design/{}", self.name)
    }

    /// Renders the CouchDB `views` member of the design document.
    #[must_use]
    pub fn views_json(&self) -> Value {
        let views: serde_json::Map<String, Value> = self
            .views
            .iter()
            .map(|v| (v.name.clone(), serde_json::json!({ "map": v.map_function() })))
            .collect();
        Value::Object(views)
    }
}
