//! OAuth 2.0 client registration.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A registered OAuth 2.0 client.
///
/// The `id` is assigned by whoever registers the client and is used as the
/// primary key of the stored document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Client {
    /// Client identifier, unique per database.
    pub id: String,

    /// Client secret.
    pub secret: String,

    /// Redirect domain associated with the client.
    pub domain: String,

    /// Owning user account. Not cascaded on delete.
    pub user_id: String,
}

impl Client {
    /// Creates a client registration.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        secret: impl Into<String>,
        domain: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
            domain: domain.into(),
            user_id: user_id.into(),
        }
    }

    /// Checks that `id` can be used as a document identifier.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRecord` if the ID is empty or starts with `_`, which
    /// document databases reserve for system documents.
    pub fn validate_id(id: &str) -> Result<(), StoreError> {
        if id.is_empty() {
            return Err(StoreError::invalid_record("client id must not be empty"));
        }
        if id.starts_with('_') {
            return Err(StoreError::invalid_record(format!(
                "client id '{id}' must not start with '_'"
            )));
        }
        Ok(())
    }
}
