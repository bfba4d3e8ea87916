//! The stored bearer credential.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::InvalidInputError;
use crate::tokens::{AccessToken, RefreshToken};

/// The credential pair attached to protected requests.
///
/// A `Credential` always holds a non-empty access token; an unauthenticated
/// client simply has no credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredCredential")]
pub struct Credential {
    pub access_token: AccessToken,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<RefreshToken>,
    pub issued_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// Create a credential issued now.
    ///
    /// # Errors
    ///
    /// Returns an error if the access token is empty.
    pub fn new(
        access_token: AccessToken,
        refresh_token: Option<RefreshToken>,
    ) -> Result<Self, InvalidInputError> {
        Self::issued_at(access_token, refresh_token, Utc::now())
    }

    /// Create a credential with an explicit issue time.
    pub fn issued_at(
        access_token: AccessToken,
        refresh_token: Option<RefreshToken>,
        issued_at: DateTime<Utc>,
    ) -> Result<Self, InvalidInputError> {
        if access_token.is_empty() {
            return Err(InvalidInputError::EmptyToken {
                kind: "access token",
            });
        }
        // An empty refresh token is as good as none.
        let refresh_token = refresh_token.filter(|t| !t.as_str().trim().is_empty());

        Ok(Self {
            access_token,
            refresh_token,
            issued_at,
            expires_at: None,
        })
    }

    /// Set the expiry from a lifetime in seconds, as reported by the server.
    ///
    /// A lifetime too large to represent leaves the expiry unknown.
    pub fn with_lifetime(mut self, seconds: Option<i64>) -> Self {
        self.expires_at = seconds
            .filter(|s| *s > 0)
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| self.issued_at.checked_add_signed(lifetime));
        self
    }

    /// Returns true if the server-reported lifetime has elapsed.
    ///
    /// A credential without a known expiry is never considered expired here;
    /// the server's 401 remains authoritative.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }

    /// Returns true if the credential expires within `margin` of `now`.
    pub fn expires_within(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.expires_at.is_some_and(|exp| now + margin >= exp)
    }

    /// Time left before expiry, clamped at zero. `None` if unknown.
    pub fn time_to_expiry(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expires_at
            .map(|exp| (exp - now).max(Duration::zero()))
    }

    /// Returns true if a refresh token is available.
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }
}

/// Wire shape of a persisted credential, checked before it becomes one.
#[derive(Deserialize)]
struct StoredCredential {
    access_token: AccessToken,
    #[serde(default)]
    refresh_token: Option<RefreshToken>,
    issued_at: DateTime<Utc>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

impl TryFrom<StoredCredential> for Credential {
    type Error = InvalidInputError;

    fn try_from(stored: StoredCredential) -> Result<Self, Self::Error> {
        let mut credential =
            Self::issued_at(stored.access_token, stored.refresh_token, stored.issued_at)?;
        credential.expires_at = stored.expires_at;
        Ok(credential)
    }
}
