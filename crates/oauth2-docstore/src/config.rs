use serde::{Deserialize, Serialize};

/// Default name of the design document holding the token index views.
pub const DEFAULT_DESIGN_DOCUMENT: &str = "token_views";

/// Token store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Design document under which the `by_code`, `by_access` and
    /// `by_refresh` views are installed.
    pub design_document: String,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            design_document: DEFAULT_DESIGN_DOCUMENT.to_string(),
        }
    }
}

impl TokenConfig {
    /// Set the design document name.
    #[must_use]
    pub fn with_design_document(mut self, name: impl Into<String>) -> Self {
        self.design_document = name.into();
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        let name = self.design_document.trim();
        if name.is_empty() {
            return Err("token.design_document must not be empty".into());
        }
        if name.contains('/') || name.starts_with('_') {
            return Err(format!(
                "token.design_document '{name}' must not contain '/' or start with '_'"
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_design_document() {
        let config = TokenConfig::default();
        assert_eq!(config.design_document, "token_views");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_names() {
        assert!(TokenConfig::default().with_design_document("").validate().is_err());
        assert!(
            TokenConfig::default()
                .with_design_document("_design/x")
                .validate()
                .is_err()
        );
        assert!(
            TokenConfig::default()
                .with_design_document("oauth2_tokens")
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_deserialize_defaults_missing_fields() {
        let config: TokenConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TokenConfig::default());
    }
}
