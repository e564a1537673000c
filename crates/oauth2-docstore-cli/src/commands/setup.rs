use std::sync::Arc;

use anyhow::{Context, Result};
use oauth2_docstore::DocumentTokenStore;
use oauth2_docstore_couchdb::CouchClient;

use crate::config::AppConfig;
use crate::output::print_success;

pub async fn ping(client: &CouchClient) -> Result<()> {
    let version = client.ping().await.context("CouchDB is not reachable")?;
    print_success(&format!("CouchDB {version} is reachable"));
    Ok(())
}

/// Runs [`ping`] as a standalone command, releasing the session either way.
pub async fn ping_and_close(client: &CouchClient) -> Result<()> {
    let result = ping(client).await;
    client.close();
    result
}

/// Creates the database if needed and installs the token views.
pub async fn setup(client: &CouchClient, config: &AppConfig) -> Result<()> {
    let name = &config.couchdb.database;
    ping(client).await?;

    let created = client
        .ensure_database(name)
        .await
        .with_context(|| format!("Failed to create database '{name}'"))?;
    if created {
        print_success(&format!("Created database {name}"));
    } else {
        print_success(&format!("Database {name} already exists"));
    }

    let db = client.database(name)?;
    let tokens = DocumentTokenStore::open(Arc::new(db), &config.token)
        .await
        .context("Failed to install token views")?;
    print_success(&format!(
        "Token views installed in {}",
        tokens.design().document_id()
    ));
    Ok(())
}
