//! Access token provider trait.

use crate::error::Result;
use chrono::{DateTime, Duration, Utc};

/// Bearer token for the issuance API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// Raw bearer token.
    pub token: String,

    /// Expiry reported by the token endpoint.
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Create an access token.
    #[must_use]
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Returns `true` if the token stays valid for at least `margin` after `now`.
    #[must_use]
    pub fn is_valid_for(&self, margin: Duration, now: DateTime<Utc>) -> bool {
        self.expires_at - margin > now
    }
}

/// Access token provider.
///
/// Acquires a bearer credential for the issuance API using the
/// application's own identity (client-credential grant).
pub trait AccessTokenProvider: Send + Sync {
    /// Acquire an access token.
    ///
    /// Implementations may return a cached token.
    ///
    /// # Errors
    ///
    /// Returns [`crate::IssuerError::TokenAcquisitionFailed`] if no token
    /// could be obtained.
    fn acquire_token(&self) -> impl std::future::Future<Output = Result<AccessToken>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_validity_margin() {
        let now = Utc::now();
        let token = AccessToken::new("t", now + Duration::minutes(10));

        assert!(token.is_valid_for(Duration::minutes(5), now));
        assert!(!token.is_valid_for(Duration::minutes(10), now));
        assert!(!token.is_valid_for(Duration::minutes(5), now + Duration::minutes(6)));
    }
}
