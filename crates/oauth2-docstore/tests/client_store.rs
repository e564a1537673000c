use std::sync::Arc;

use oauth2_docstore::{Client, ClientStorage, DocumentClientStore};
use oauth2_docstore_memory::InMemoryDocumentStore;
use oauth2_docstore_storage::{DocumentId, DocumentStore};
use serde_json::json;

mod common;

use common::{Race, RacingStore};

fn setup() -> (Arc<InMemoryDocumentStore>, DocumentClientStore) {
    let db = Arc::new(InMemoryDocumentStore::new("oauth2"));
    let clients = DocumentClientStore::new(db.clone());
    (db, clients)
}

fn sample_client() -> Client {
    Client::new("app-1", "s3cret", "https://app.example", "user-7")
}

#[tokio::test]
async fn test_set_then_get() {
    let (_, clients) = setup();
    let client = sample_client();

    clients.set(&client).await.unwrap();
    assert_eq!(clients.get_by_id("app-1").await.unwrap(), client);
}

#[tokio::test]
async fn test_set_replaces_existing_client() {
    let (db, clients) = setup();
    clients.set(&sample_client()).await.unwrap();

    let replacement = Client::new("app-1", "rotated", "https://new.example", "");
    clients.set(&replacement).await.unwrap();

    assert_eq!(clients.get_by_id("app-1").await.unwrap(), replacement);
    let doc = db.get(&DocumentId::new("app-1")).await.unwrap().unwrap();
    assert_eq!(doc.revision.generation(), Some(2));
    assert_eq!(
        doc.body,
        json!({"secret": "rotated", "domain": "https://new.example", "userid": ""})
    );
}

#[tokio::test]
async fn test_get_missing_client() {
    let (_, clients) = setup();
    let err = clients.get_by_id("nope").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_reads_existing_client_document() {
    let (db, clients) = setup();
    db.put(
        &DocumentId::new("legacy"),
        &json!({"secret": "s", "domain": "d", "userid": "u"}),
        None,
    )
    .await
    .unwrap();

    let client = clients.get_by_id("legacy").await.unwrap();
    assert_eq!(client, Client::new("legacy", "s", "d", "u"));
}

#[tokio::test]
async fn test_remove_then_get_is_not_found() {
    let (_, clients) = setup();
    clients.set(&sample_client()).await.unwrap();

    clients.remove_by_id("app-1").await.unwrap();
    assert!(clients.get_by_id("app-1").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_remove_missing_client() {
    let (_, clients) = setup();
    let err = clients.remove_by_id("nope").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_reserved_ids_rejected() {
    let (_, clients) = setup();
    let err = clients
        .set(&Client::new("_design/token_views", "s", "d", "u"))
        .await
        .unwrap_err();
    assert!(err.is_invalid_record());

    let err = clients.set(&Client::new("", "s", "d", "u")).await.unwrap_err();
    assert!(err.is_invalid_record());

    assert!(clients.get_by_id("").await.unwrap_err().is_not_found());
    assert!(clients.remove_by_id("_all_docs").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_closed_session() {
    let (db, clients) = setup();
    clients.set(&sample_client()).await.unwrap();

    db.close().await;
    assert!(clients.get_by_id("app-1").await.unwrap_err().is_closed());
    assert!(clients.set(&sample_client()).await.unwrap_err().is_closed());
    assert!(clients.remove_by_id("app-1").await.unwrap_err().is_closed());
}

#[tokio::test]
async fn test_set_conflicting_twice_is_conflict() {
    let db = Arc::new(RacingStore::new(Arc::new(InMemoryDocumentStore::new("oauth2"))));
    let clients = DocumentClientStore::new(db.clone());
    clients.set(&sample_client()).await.unwrap();

    db.set_race(Race::PutConflict);
    let err = clients
        .set(&Client::new("app-1", "rotated", "d", "u"))
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    assert_eq!(clients.get_by_id("app-1").await.unwrap(), sample_client());
}

#[tokio::test]
async fn test_remove_after_concurrent_rewrite_is_conflict() {
    let db = Arc::new(RacingStore::new(Arc::new(InMemoryDocumentStore::new("oauth2"))));
    let clients = DocumentClientStore::new(db.clone());
    clients.set(&sample_client()).await.unwrap();

    db.set_race(Race::DeleteConflict);
    assert!(clients.remove_by_id("app-1").await.unwrap_err().is_conflict());
}
