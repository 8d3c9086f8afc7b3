use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An OAuth-style API credential for the streaming service.
///
/// The credential gates the direct media transport: with a valid
/// credential the engine may resolve tracks through the API and drive the
/// media element; without one it goes straight to the widget transport.
///
/// The token value is deliberately excluded from `Debug` output so the
/// credential can be logged safely.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCredential {
    /// The opaque token value attached to API requests.
    token: String,
    /// When the credential was obtained.
    pub obtained_at: DateTime<Utc>,
    /// Optional expiry; `None` means the service did not report one.
    pub expires_at: Option<DateTime<Utc>>,
}

impl ApiCredential {
    pub fn new(token: impl Into<String>, obtained_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            obtained_at,
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Borrow the token value. Callers must not log it.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Whether the credential is valid at the given instant.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.token.is_empty() && self.expires_at.map(|e| now < e).unwrap_or(true)
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("token", &"<redacted>")
            .field("obtained_at", &self.obtained_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn debug_redacts_token() {
        let cred = ApiCredential::new("secret-token", Utc::now());
        let rendered = format!("{:?}", cred);
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn validity_respects_expiry() {
        let now = Utc::now();
        let cred = ApiCredential::new("tok", now).with_expiry(now + Duration::hours(1));
        assert!(cred.is_valid_at(now));
        assert!(!cred.is_valid_at(now + Duration::hours(2)));

        let empty = ApiCredential::new("", now);
        assert!(!empty.is_valid_at(now));
    }
}
