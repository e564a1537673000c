//! Token storage trait.

use async_trait::async_trait;

use crate::StoreResult;
use crate::types::TokenRecord;

// =============================================================================
// Token Storage Trait
// =============================================================================

/// Storage operations for token records.
///
/// A record is reachable through each of its non-empty authorization code,
/// access token and refresh token. Removing it through any one of them
/// removes the whole record.
#[async_trait]
pub trait TokenStorage: Send + Sync {
    /// Store a new token record.
    ///
    /// Uniqueness of the code/access/refresh values is not checked here.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRecord` if the record carries no token at all, or an
    /// error if the storage operation fails.
    async fn create(&self, record: &TokenRecord) -> StoreResult<()>;

    /// Find the record holding an authorization code.
    ///
    /// # Errors
    ///
    /// Returns `Consistency` if more than one record holds the code, or an
    /// error if the storage operation fails.
    async fn get_by_code(&self, code: &str) -> StoreResult<Option<TokenRecord>>;

    /// Find the record holding an access token.
    ///
    /// # Errors
    ///
    /// Returns `Consistency` if more than one record holds the token, or an
    /// error if the storage operation fails.
    async fn get_by_access(&self, access: &str) -> StoreResult<Option<TokenRecord>>;

    /// Find the record holding a refresh token.
    ///
    /// # Errors
    ///
    /// Returns `Consistency` if more than one record holds the token, or an
    /// error if the storage operation fails.
    async fn get_by_refresh(&self, refresh: &str) -> StoreResult<Option<TokenRecord>>;

    /// Delete the record holding an authorization code.
    ///
    /// Succeeds when no record holds the code.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - More than one record holds the code (`Consistency`)
    /// - Another caller deleted the record first (`Conflict`)
    /// - The storage operation fails (`Persistence`)
    async fn remove_by_code(&self, code: &str) -> StoreResult<()>;

    /// Delete the record holding an access token.
    ///
    /// # Errors
    ///
    /// See [`TokenStorage::remove_by_code`].
    async fn remove_by_access(&self, access: &str) -> StoreResult<()>;

    /// Delete the record holding a refresh token.
    ///
    /// # Errors
    ///
    /// See [`TokenStorage::remove_by_code`].
    async fn remove_by_refresh(&self, refresh: &str) -> StoreResult<()>;

    /// Release the database session. Later calls fail with `Closed`.
    async fn close(&self);
}
