//! Token record: one grant's authorization code, access token and refresh
//! token, each with its own creation time and lifetime.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A stored token triple.
///
/// The serialized form uses the field names, nanosecond durations and
/// empty-string sentinels of the `Payload` member that existing token
/// documents carry, so records written by earlier deployments read back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TokenRecord {
    #[serde(rename = "ClientID", default)]
    pub client_id: String,

    #[serde(rename = "UserID", default)]
    pub user_id: String,

    #[serde(rename = "RedirectURI", default)]
    pub redirect_uri: String,

    #[serde(default)]
    pub scope: String,

    /// Authorization code.
    #[serde(default, with = "empty_as_none")]
    pub code: Option<String>,

    #[serde(default, with = "zero_time_as_none")]
    pub code_create_at: Option<OffsetDateTime>,

    /// Lifetime of the code. Zero means no expiry; must fit in `i64` nanoseconds.
    #[serde(default, with = "nanoseconds")]
    pub code_expires_in: Duration,

    /// Access token.
    #[serde(default, with = "empty_as_none")]
    pub access: Option<String>,

    #[serde(default, with = "zero_time_as_none")]
    pub access_create_at: Option<OffsetDateTime>,

    #[serde(default, with = "nanoseconds")]
    pub access_expires_in: Duration,

    /// Refresh token.
    #[serde(default, with = "empty_as_none")]
    pub refresh: Option<String>,

    #[serde(default, with = "zero_time_as_none")]
    pub refresh_create_at: Option<OffsetDateTime>,

    #[serde(default, with = "nanoseconds")]
    pub refresh_expires_in: Duration,
}

impl TokenRecord {
    /// Creates an empty record for a client/user pair.
    #[must_use]
    pub fn new(client_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = redirect_uri.into();
        self
    }

    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Sets the authorization code, its creation time and lifetime.
    #[must_use]
    pub fn with_code(
        mut self,
        code: impl Into<String>,
        created_at: OffsetDateTime,
        expires_in: Duration,
    ) -> Self {
        self.code = non_empty(code.into());
        self.code_create_at = Some(created_at);
        self.code_expires_in = expires_in;
        self
    }

    /// Sets the access token, its creation time and lifetime.
    #[must_use]
    pub fn with_access(
        mut self,
        access: impl Into<String>,
        created_at: OffsetDateTime,
        expires_in: Duration,
    ) -> Self {
        self.access = non_empty(access.into());
        self.access_create_at = Some(created_at);
        self.access_expires_in = expires_in;
        self
    }

    /// Sets the refresh token, its creation time and lifetime.
    #[must_use]
    pub fn with_refresh(
        mut self,
        refresh: impl Into<String>,
        created_at: OffsetDateTime,
        expires_in: Duration,
    ) -> Self {
        self.refresh = non_empty(refresh.into());
        self.refresh_create_at = Some(created_at);
        self.refresh_expires_in = expires_in;
        self
    }

    /// Returns `true` if at least one of code, access or refresh is set.
    #[must_use]
    pub fn has_any_token(&self) -> bool {
        [&self.code, &self.access, &self.refresh]
            .iter()
            .any(|t| t.as_deref().is_some_and(|v| !v.is_empty()))
    }

    /// Instant at which the authorization code expires, if it does.
    #[must_use]
    pub fn code_expires_at(&self) -> Option<OffsetDateTime> {
        expires_at(self.code_create_at, self.code_expires_in)
    }

    /// Instant at which the access token expires, if it does.
    #[must_use]
    pub fn access_expires_at(&self) -> Option<OffsetDateTime> {
        expires_at(self.access_create_at, self.access_expires_in)
    }

    /// Instant at which the refresh token expires, if it does.
    #[must_use]
    pub fn refresh_expires_at(&self) -> Option<OffsetDateTime> {
        expires_at(self.refresh_create_at, self.refresh_expires_in)
    }

    #[must_use]
    pub fn is_code_expired(&self, now: OffsetDateTime) -> bool {
        self.code_expires_at().is_some_and(|at| now >= at)
    }

    #[must_use]
    pub fn is_access_expired(&self, now: OffsetDateTime) -> bool {
        self.access_expires_at().is_some_and(|at| now >= at)
    }

    #[must_use]
    pub fn is_refresh_expired(&self, now: OffsetDateTime) -> bool {
        self.refresh_expires_at().is_some_and(|at| now >= at)
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn expires_at(created_at: Option<OffsetDateTime>, lifetime: Duration) -> Option<OffsetDateTime> {
    if lifetime.is_zero() {
        return None;
    }
    let created_at = created_at?;
    let lifetime = time::Duration::try_from(lifetime).ok()?;
    created_at.checked_add(lifetime)
}

/// Absent tokens are stored as `""`.
mod empty_as_none {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(value.as_deref().unwrap_or_default())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let value = Option::<String>::deserialize(d)?;
        Ok(value.filter(|v| !v.is_empty()))
    }
}

/// RFC 3339 timestamps; an unset time is stored as `0001-01-01T00:00:00Z`.
mod zero_time_as_none {
    use serde::{Deserialize, Deserializer, Serializer, de, ser};
    use time::OffsetDateTime;
    use time::format_description::well_known::Rfc3339;
    use time::macros::datetime;

    const ZERO: OffsetDateTime = datetime!(0001-01-01 0:00 UTC);
    const ZERO_TIME: &str = "0001-01-01T00:00:00Z";

    pub fn serialize<S: Serializer>(
        value: &Option<OffsetDateTime>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(t) => {
                let formatted = t.format(&Rfc3339).map_err(ser::Error::custom)?;
                s.serialize_str(&formatted)
            }
            None => s.serialize_str(ZERO_TIME),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<OffsetDateTime>, D::Error> {
        let Some(raw) = Option::<String>::deserialize(d)? else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }
        let parsed = OffsetDateTime::parse(&raw, &Rfc3339).map_err(de::Error::custom)?;
        Ok((parsed != ZERO).then_some(parsed))
    }
}

/// Durations as signed integer nanoseconds. Negative values read as zero;
/// lifetimes beyond `i64::MAX` nanoseconds (about 292 years) do not serialize.
mod nanoseconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, ser};

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        let nanos = i64::try_from(value.as_nanos()).map_err(|_| {
            ser::Error::custom(format!("duration {value:?} overflows i64 nanoseconds"))
        })?;
        s.serialize_i64(nanos)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let nanos = Option::<i64>::deserialize(d)?.unwrap_or_default();
        Ok(Duration::from_nanos(u64::try_from(nanos).unwrap_or(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    fn sample() -> TokenRecord {
        TokenRecord::new("app-1", "user-7")
            .with_redirect_uri("https://app.example/cb")
            .with_scope("read write")
            .with_code("c1", datetime!(2024-03-01 10:00:00 UTC), Duration::from_secs(600))
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["ClientID"], "app-1");
        assert_eq!(value["UserID"], "user-7");
        assert_eq!(value["RedirectURI"], "https://app.example/cb");
        assert_eq!(value["Scope"], "read write");
        assert_eq!(value["Code"], "c1");
        assert_eq!(value["CodeCreateAt"], "2024-03-01T10:00:00Z");
        assert_eq!(value["CodeExpiresIn"], 600_000_000_000_i64);
        assert_eq!(value["Access"], "");
        assert_eq!(value["AccessCreateAt"], "0001-01-01T00:00:00Z");
        assert_eq!(value["AccessExpiresIn"], 0);
    }

    #[test]
    fn test_reads_existing_payload() {
        let payload = json!({
            "ClientID": "app-1",
            "UserID": "user-7",
            "RedirectURI": "https://app.example/cb",
            "Scope": "read",
            "Code": "",
            "CodeCreateAt": "0001-01-01T00:00:00Z",
            "CodeExpiresIn": 0,
            "Access": "a1",
            "AccessCreateAt": "2024-03-01T12:00:00.123456789+02:00",
            "AccessExpiresIn": 7_200_000_000_000_i64,
            "Refresh": "r1",
            "RefreshCreateAt": "2024-03-01T12:00:00+02:00",
            "RefreshExpiresIn": 0
        });

        let record: TokenRecord = serde_json::from_value(payload).unwrap();
        assert_eq!(record.code, None);
        assert_eq!(record.code_create_at, None);
        assert_eq!(record.access.as_deref(), Some("a1"));
        assert_eq!(
            record.access_create_at,
            Some(datetime!(2024-03-01 10:00:00.123456789 UTC))
        );
        assert_eq!(record.access_expires_in, Duration::from_secs(7200));
        assert_eq!(record.refresh.as_deref(), Some("r1"));
    }

    #[test]
    fn test_missing_and_negative_fields() {
        let record: TokenRecord =
            serde_json::from_value(json!({"Access": "a1", "AccessExpiresIn": -5})).unwrap();
        assert_eq!(record.client_id, "");
        assert_eq!(record.access_expires_in, Duration::ZERO);
        assert_eq!(record.code, None);
    }

    #[test]
    fn test_oversized_lifetime_fails_to_serialize() {
        let record = TokenRecord::new("app-1", "u").with_access(
            "a1",
            datetime!(2024-03-01 10:00:00 UTC),
            Duration::from_secs(u64::MAX),
        );
        let err = serde_json::to_value(&record).unwrap_err();
        assert!(err.to_string().contains("overflows"));

        let max = Duration::from_nanos(i64::MAX as u64);
        let record = TokenRecord::new("app-1", "u").with_access(
            "a1",
            datetime!(2024-03-01 10:00:00 UTC),
            max,
        );
        let value = serde_json::to_value(&record).unwrap();
        let back: TokenRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back.access_expires_in, max);
    }

    #[test]
    fn test_has_any_token() {
        assert!(!TokenRecord::new("app-1", "u").has_any_token());
        assert!(sample().has_any_token());

        let blank = TokenRecord::new("app-1", "u").with_access(
            "",
            datetime!(2024-03-01 10:00:00 UTC),
            Duration::from_secs(60),
        );
        assert!(!blank.has_any_token());
    }

    #[test]
    fn test_expiry_helpers() {
        let record = sample();
        let expires = datetime!(2024-03-01 10:10:00 UTC);
        assert_eq!(record.code_expires_at(), Some(expires));
        assert!(!record.is_code_expired(datetime!(2024-03-01 10:09:59 UTC)));
        assert!(record.is_code_expired(expires));

        assert_eq!(record.access_expires_at(), None);
        assert!(!record.is_access_expired(datetime!(2999-01-01 0:00 UTC)));
        assert!(!record.is_refresh_expired(datetime!(2999-01-01 0:00 UTC)));
    }
}
