use std::sync::Arc;

use futures_util::future::join_all;
use oauth2_docstore_memory::InMemoryDocumentStore;
use oauth2_docstore_storage::{DesignDocument, DocumentId, DocumentStore, Revision, ViewDefinition};
use serde_json::json;

fn token_design() -> DesignDocument {
    DesignDocument::new("token_views")
        .with_view(ViewDefinition::new("by_code", &["Payload", "Code"]))
        .with_view(ViewDefinition::new("by_access", &["Payload", "Access"]))
}

#[tokio::test]
async fn test_create_then_get() {
    let store = InMemoryDocumentStore::new("oauth2");
    let body = json!({"Payload": {"Code": "c1"}});

    let (id, rev) = store.create(&body).await.unwrap();
    assert_eq!(rev.generation(), Some(1));

    let doc = store.get(&id).await.unwrap().unwrap();
    assert_eq!(doc.id, id);
    assert_eq!(doc.revision, rev);
    assert_eq!(doc.body, body);
    assert_eq!(store.get_revision(&id).await.unwrap(), Some(rev));
}

#[tokio::test]
async fn test_get_missing_returns_none() {
    let store = InMemoryDocumentStore::new("oauth2");
    let id = DocumentId::new("missing");
    assert!(store.get(&id).await.unwrap().is_none());
    assert!(store.get_revision(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_put_requires_current_revision() {
    let store = InMemoryDocumentStore::new("oauth2");
    let id = DocumentId::new("client-1");

    let first = store.put(&id, &json!({"secret": "a"}), None).await.unwrap();

    let err = store
        .put(&id, &json!({"secret": "b"}), None)
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    let err = store
        .put(&id, &json!({"secret": "b"}), Some(&Revision::new("9-stale")))
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    let second = store
        .put(&id, &json!({"secret": "b"}), Some(&first))
        .await
        .unwrap();
    assert_eq!(second.generation(), Some(2));

    let doc = store.get(&id).await.unwrap().unwrap();
    assert_eq!(doc.body, json!({"secret": "b"}));
}

#[tokio::test]
async fn test_put_rejects_reserved_members() {
    let store = InMemoryDocumentStore::new("oauth2");
    let err = store
        .put(&DocumentId::new("x"), &json!({"_rev": "1-a"}), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        oauth2_docstore_storage::StorageError::InvalidDocument { .. }
    ));
}

#[tokio::test]
async fn test_delete_is_revision_guarded() {
    let store = InMemoryDocumentStore::new("oauth2");
    let (id, rev) = store.create(&json!({"Payload": {}})).await.unwrap();

    let err = store
        .delete(&id, &Revision::new("1-other"))
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    store.delete(&id, &rev).await.unwrap();
    assert!(store.get(&id).await.unwrap().is_none());

    let err = store.delete(&id, &rev).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_view_tracks_document_content() {
    let store = InMemoryDocumentStore::new("oauth2");
    store.install_design(&token_design()).await.unwrap();

    let (id, rev) = store
        .create(&json!({"Payload": {"Code": "c1", "Access": "a1"}}))
        .await
        .unwrap();

    assert_eq!(
        store.query_view("token_views", "by_code", "c1").await.unwrap(),
        vec![id.clone()]
    );
    assert_eq!(
        store.query_view("token_views", "by_access", "a1").await.unwrap(),
        vec![id.clone()]
    );
    assert!(
        store
            .query_view("token_views", "by_code", "other")
            .await
            .unwrap()
            .is_empty()
    );

    store.delete(&id, &rev).await.unwrap();
    assert!(
        store
            .query_view("token_views", "by_code", "c1")
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_view_follows_rewrites() {
    let store = InMemoryDocumentStore::new("oauth2");
    store.install_design(&token_design()).await.unwrap();

    let id = DocumentId::new("fixed");
    let rev = store
        .put(&id, &json!({"Payload": {"Code": "before"}}), None)
        .await
        .unwrap();
    store
        .put(&id, &json!({"Payload": {"Code": "after"}}), Some(&rev))
        .await
        .unwrap();

    assert!(
        store
            .query_view("token_views", "by_code", "before")
            .await
            .unwrap()
            .is_empty()
    );
    assert_eq!(
        store.query_view("token_views", "by_code", "after").await.unwrap(),
        vec![id]
    );
}

#[tokio::test]
async fn test_design_installed_after_documents_indexes_them() {
    let store = InMemoryDocumentStore::new("oauth2");
    let (id, _) = store
        .create(&json!({"Payload": {"Code": "early"}}))
        .await
        .unwrap();

    store.install_design(&token_design()).await.unwrap();
    store.install_design(&token_design()).await.unwrap();

    assert_eq!(
        store.query_view("token_views", "by_code", "early").await.unwrap(),
        vec![id]
    );
}

#[tokio::test]
async fn test_duplicate_keys_resolve_to_every_document() {
    let store = InMemoryDocumentStore::new("oauth2");
    store.install_design(&token_design()).await.unwrap();

    let (a, _) = store.create(&json!({"Payload": {"Code": "dup"}})).await.unwrap();
    let (b, _) = store.create(&json!({"Payload": {"Code": "dup"}})).await.unwrap();

    let mut ids = store.query_view("token_views", "by_code", "dup").await.unwrap();
    ids.sort();
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_limited_query_truncates() {
    let store = InMemoryDocumentStore::new("oauth2");
    store.install_design(&token_design()).await.unwrap();
    for _ in 0..3 {
        store.create(&json!({"Payload": {"Code": "dup"}})).await.unwrap();
    }

    let ids = store
        .query_view_limited("token_views", "by_code", "dup", 2)
        .await
        .unwrap();
    assert_eq!(ids.len(), 2);
    assert_eq!(
        store.query_view("token_views", "by_code", "dup").await.unwrap().len(),
        3
    );
}

#[tokio::test]
async fn test_query_unknown_view() {
    let store = InMemoryDocumentStore::new("oauth2");
    let err = store
        .query_view("token_views", "by_code", "c1")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        oauth2_docstore_storage::StorageError::ViewNotFound { .. }
    ));

    store.install_design(&token_design()).await.unwrap();
    let err = store
        .query_view("token_views", "by_refresh", "r1")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        oauth2_docstore_storage::StorageError::ViewNotFound { .. }
    ));
}

#[tokio::test]
async fn test_close_rejects_later_calls() {
    let store = InMemoryDocumentStore::new("oauth2");
    let (id, _) = store.create(&json!({"Payload": {}})).await.unwrap();

    store.close().await;
    store.close().await;
    assert!(store.is_closed());

    assert!(store.get(&id).await.unwrap_err().is_closed());
    assert!(store.create(&json!({})).await.unwrap_err().is_closed());
    assert!(
        store
            .query_view("token_views", "by_code", "c1")
            .await
            .unwrap_err()
            .is_closed()
    );
}

#[tokio::test]
async fn test_concurrent_creates_get_distinct_ids() {
    let store = Arc::new(InMemoryDocumentStore::new("oauth2"));
    store.install_design(&token_design()).await.unwrap();

    let tasks = (0..32).map(|i| {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            store
                .create(&json!({"Payload": {"Code": format!("code-{i}")}}))
                .await
                .unwrap()
                .0
        })
    });
    let mut ids: Vec<DocumentId> = join_all(tasks)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();
    ids.sort();
    ids.dedup();

    assert_eq!(ids.len(), 32);
    assert_eq!(store.document_count(), 32);
    for i in 0..32 {
        let found = store
            .query_view("token_views", "by_code", &format!("code-{i}"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }
}
