//! Implementation of the DocumentStore trait for a CouchDB database.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::ETAG;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, instrument};

use oauth2_docstore_storage::{
    DesignDocument, DocumentId, DocumentStore, Revision, StorageError, StoredDocument,
};

use crate::client::{Session, read_body};
use crate::error::Target;

/// Body of a successful write (`PUT`, `POST`, `DELETE`).
#[derive(Debug, Deserialize)]
struct WriteResponse {
    id: String,
    rev: String,
}

#[derive(Debug, Deserialize)]
struct ViewResponse {
    rows: Vec<ViewRow>,
}

#[derive(Debug, Deserialize)]
struct ViewRow {
    id: String,
}

/// A handle to one database of a CouchDB session.
///
/// Handles are cheap to clone and share the session of the
/// [`CouchClient`](crate::CouchClient) that created them.
#[derive(Debug, Clone)]
pub struct CouchDatabase {
    session: Arc<Session>,
    name: Arc<str>,
}

impl CouchDatabase {
    pub(crate) fn new(session: Arc<Session>, name: &str) -> Self {
        Self {
            session,
            name: Arc::from(name),
        }
    }

    fn target<'a>(&'a self, id: &'a str) -> Target<'a> {
        Target::Document {
            database: &self.name,
            id,
        }
    }

    /// Design documents live under `_design/<name>`; both parts are separate
    /// path segments so the slash is not escaped.
    fn document_segments<'a>(&'a self, id: &'a str) -> Vec<&'a str> {
        match id.strip_prefix("_design/") {
            Some(design) => vec![&*self.name, "_design", design],
            None => vec![&*self.name, id],
        }
    }

    async fn fetch_raw(&self, id: &str) -> Result<Option<Value>, StorageError> {
        let url = self.session.url(&self.document_segments(id))?;
        let response = self
            .session
            .send(self.session.request(Method::GET, url))
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = read_body(response, self.target(id)).await?;
        Ok(Some(serde_json::from_slice(&body)?))
    }

    async fn fetch_view(
        &self,
        design: &str,
        view: &str,
        key: &str,
        limit: Option<usize>,
    ) -> Result<Vec<DocumentId>, StorageError> {
        let url = self
            .session
            .url(&[&*self.name, "_design", design, "_view", view])?;
        let mut req = self
            .session
            .request(Method::GET, url)
            .query(&[("key", serde_json::to_string(key)?)]);
        if let Some(limit) = limit {
            req = req.query(&[("limit", limit)]);
        }
        let response = self.session.send(req).await?;
        let body = read_body(response, Target::View { design, view }).await?;
        let result: ViewResponse = serde_json::from_slice(&body)?;

        Ok(result
            .rows
            .into_iter()
            .map(|row| DocumentId::new(row.id))
            .collect())
    }

    async fn put_raw(
        &self,
        id: &str,
        body: &Value,
        revision: Option<&Revision>,
    ) -> Result<Revision, StorageError> {
        let url = self.session.url(&self.document_segments(id))?;
        let mut req = self.session.request(Method::PUT, url).json(body);
        if let Some(rev) = revision {
            req = req.query(&[("rev", rev.as_str())]);
        }
        let response = self.session.send(req).await?;
        let body = read_body(response, self.target(id)).await?;
        let written: WriteResponse = serde_json::from_slice(&body)?;
        Ok(Revision::new(written.rev))
    }
}

#[async_trait]
impl DocumentStore for CouchDatabase {
    #[instrument(skip_all, fields(database = %self.name, id = %id))]
    async fn get(&self, id: &DocumentId) -> Result<Option<StoredDocument>, StorageError> {
        let Some(body) = self.fetch_raw(id.as_str()).await? else {
            return Ok(None);
        };
        let revision = body
            .get("_rev")
            .and_then(Value::as_str)
            .map(Revision::new)
            .ok_or_else(|| StorageError::invalid_document("document has no _rev member"))?;
        Ok(Some(StoredDocument::new(id.clone(), revision, body)))
    }

    #[instrument(skip_all, fields(database = %self.name, id = %id))]
    async fn get_revision(&self, id: &DocumentId) -> Result<Option<Revision>, StorageError> {
        let url = self.session.url(&self.document_segments(id.as_str()))?;
        let response = self
            .session
            .send(self.session.request(Method::HEAD, url))
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim_matches('"').to_string());
        read_body(response, self.target(id.as_str())).await?;

        etag.map(Revision::new)
            .map(Some)
            .ok_or_else(|| StorageError::backend(200, "HEAD response carried no ETag"))
    }

    #[instrument(skip_all, fields(database = %self.name, id = %id))]
    async fn put(
        &self,
        id: &DocumentId,
        body: &Value,
        revision: Option<&Revision>,
    ) -> Result<Revision, StorageError> {
        let rev = self.put_raw(id.as_str(), body, revision).await?;
        debug!(rev = %rev, "document written");
        Ok(rev)
    }

    #[instrument(skip_all, fields(database = %self.name))]
    async fn create(&self, body: &Value) -> Result<(DocumentId, Revision), StorageError> {
        let url = self.session.url(&[&*self.name])?;
        let response = self
            .session
            .send(self.session.request(Method::POST, url).json(body))
            .await?;
        let body = read_body(response, self.target("")).await?;
        let written: WriteResponse = serde_json::from_slice(&body)?;

        debug!(id = %written.id, "document created");
        Ok((DocumentId::new(written.id), Revision::new(written.rev)))
    }

    #[instrument(skip_all, fields(database = %self.name, id = %id))]
    async fn delete(&self, id: &DocumentId, revision: &Revision) -> Result<Revision, StorageError> {
        let url = self.session.url(&self.document_segments(id.as_str()))?;
        let req = self
            .session
            .request(Method::DELETE, url)
            .query(&[("rev", revision.as_str())]);
        let response = self.session.send(req).await?;
        let body = read_body(response, self.target(id.as_str())).await?;
        let written: WriteResponse = serde_json::from_slice(&body)?;

        debug!("document deleted");
        Ok(Revision::new(written.rev))
    }

    #[instrument(skip_all, fields(database = %self.name, design = %design, view = %view))]
    async fn query_view(
        &self,
        design: &str,
        view: &str,
        key: &str,
    ) -> Result<Vec<DocumentId>, StorageError> {
        self.fetch_view(design, view, key, None).await
    }

    #[instrument(skip_all, fields(database = %self.name, design = %design, view = %view, limit = limit))]
    async fn query_view_limited(
        &self,
        design: &str,
        view: &str,
        key: &str,
        limit: usize,
    ) -> Result<Vec<DocumentId>, StorageError> {
        self.fetch_view(design, view, key, Some(limit)).await
    }

    #[instrument(skip_all, fields(database = %self.name, design = %design.name))]
    async fn install_design(&self, design: &DesignDocument) -> Result<(), StorageError> {
        let id = design.document_id();
        let views = design.views_json();

        let current = self.fetch_raw(&id).await?;
        let revision = match &current {
            Some(doc) if doc.get("views") == Some(&views) => {
                debug!("design document up to date");
                return Ok(());
            }
            Some(doc) => doc.get("_rev").and_then(Value::as_str).map(Revision::new),
            None => None,
        };

        let body = json!({ "language": "javascript", "views": views });
        match self.put_raw(&id, &body, revision.as_ref()).await {
            Ok(_) => {}
            // Another process installed it concurrently.
            Err(e) if e.is_conflict() => {
                let installed = self.fetch_raw(&id).await?;
                if installed.as_ref().and_then(|doc| doc.get("views")) != Some(&views) {
                    return Err(e);
                }
            }
            Err(e) => return Err(e),
        }

        info!(views = design.views.len(), "design document installed");
        Ok(())
    }

    async fn close(&self) {
        if self.session.mark_closed() {
            info!(database = %self.name, "CouchDB session closed");
        }
    }

    fn is_closed(&self) -> bool {
        self.session.is_closed()
    }

    fn database_name(&self) -> &str {
        &self.name
    }

    fn backend_name(&self) -> &'static str {
        "couchdb"
    }
}
