//! Secondary indexes over token documents.

use std::fmt;

use oauth2_docstore_storage::{DesignDocument, DocumentId, DocumentStore, ViewDefinition};
use tracing::warn;

use crate::error::StoreError;

/// Payload member holding the token record inside a token document.
pub(crate) const PAYLOAD_FIELD: &str = "Payload";

/// One of the three keys a token record can be looked up by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenIndex {
    Code,
    Access,
    Refresh,
}

impl TokenIndex {
    pub const ALL: [TokenIndex; 3] = [Self::Code, Self::Access, Self::Refresh];

    /// Name of the view backing this index.
    #[must_use]
    pub fn view_name(self) -> &'static str {
        match self {
            Self::Code => "by_code",
            Self::Access => "by_access",
            Self::Refresh => "by_refresh",
        }
    }

    /// Payload member the view emits.
    #[must_use]
    pub fn payload_field(self) -> &'static str {
        match self {
            Self::Code => "Code",
            Self::Access => "Access",
            Self::Refresh => "Refresh",
        }
    }

    #[must_use]
    pub fn view(self) -> ViewDefinition {
        ViewDefinition::new(self.view_name(), &[PAYLOAD_FIELD, self.payload_field()])
    }
}

impl fmt::Display for TokenIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code => write!(f, "authorization code"),
            Self::Access => write!(f, "access token"),
            Self::Refresh => write!(f, "refresh token"),
        }
    }
}

/// Builds the design document defining all three token views.
#[must_use]
pub fn token_design(name: &str) -> DesignDocument {
    TokenIndex::ALL
        .into_iter()
        .fold(DesignDocument::new(name), |design, index| {
            design.with_view(index.view())
        })
}

/// Enough rows to tell a unique key from an ambiguous one.
const RESOLVE_LIMIT: usize = 2;

/// Resolves `key` through `index` to at most one document ID.
pub(crate) async fn resolve(
    store: &dyn DocumentStore,
    design: &str,
    index: TokenIndex,
    key: &str,
) -> Result<Option<DocumentId>, StoreError> {
    let mut ids = store
        .query_view_limited(design, index.view_name(), key, RESOLVE_LIMIT)
        .await?;
    ids.sort();
    ids.dedup();

    match ids.len() {
        0 => Ok(None),
        1 => Ok(ids.pop()),
        matches => {
            warn!(
                database = store.database_name(),
                index = %index,
                matches,
                "index resolved to multiple token documents"
            );
            Err(StoreError::consistency(index, matches))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_design_views() {
        let design = token_design("token_views");
        assert_eq!(design.document_id(), "_design/token_views");
        assert_eq!(design.views.len(), 3);

        let by_refresh = design.view("by_refresh").unwrap();
        assert_eq!(by_refresh.key_path, vec!["Payload", "Refresh"]);
        assert_eq!(
            by_refresh.map_function(),
            "function (doc) { if (doc.Payload && doc.Payload.Refresh) { emit(doc.Payload.Refresh, null); } }"
        );
    }

    #[test]
    fn test_index_names() {
        assert_eq!(TokenIndex::Code.view_name(), "by_code");
        assert_eq!(TokenIndex::Access.payload_field(), "Access");
        assert_eq!(TokenIndex::Refresh.to_string(), "refresh token");
    }
}
