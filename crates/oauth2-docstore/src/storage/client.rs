//! Client storage trait.

use async_trait::async_trait;

use crate::StoreResult;
use crate::types::Client;

// =============================================================================
// Client Storage Trait
// =============================================================================

/// Storage operations for OAuth 2.0 client registrations.
///
/// # Example
///
/// ```ignore
/// use oauth2_docstore::storage::ClientStorage;
///
/// async fn example(storage: &impl ClientStorage) -> StoreResult<()> {
///     let client = storage.get_by_id("my-app").await?;
///     println!("Found client for domain {}", client.domain);
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait ClientStorage: Send + Sync {
    /// Store a client, replacing any existing registration with the same ID.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The client ID is not a usable document ID (`InvalidRecord`)
    /// - A concurrent writer changed the registration mid-update (`Conflict`)
    /// - The storage operation fails (`Persistence`)
    async fn set(&self, client: &Client) -> StoreResult<()>;

    /// Look up a client by its ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such client exists, or an error if the
    /// storage operation fails.
    async fn get_by_id(&self, id: &str) -> StoreResult<Client>;

    /// Delete a client registration.
    ///
    /// The current revision is read first and the delete is conditioned on
    /// it; a lost race is reported, not retried.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The client doesn't exist (`NotFound`)
    /// - The registration changed between read and delete (`Conflict`)
    /// - The storage operation fails (`Persistence`)
    async fn remove_by_id(&self, id: &str) -> StoreResult<()>;
}
