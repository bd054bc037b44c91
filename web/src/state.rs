//! Application state for Axum handlers.

use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};
use std::sync::Arc;
use vc_issuer::IssuanceService;
use vc_issuer::providers::{AccessTokenProvider, IssuanceApi, IssuanceEventLog, SessionStore};

/// Application state shared across all HTTP handlers.
///
/// # Type Parameters
///
/// - `S`: Session store
/// - `T`: Access token provider
/// - `A`: Issuance API
/// - `L`: Issuance event log
pub struct AppState<S, T, A, L>
where
    S: SessionStore + Clone,
    T: AccessTokenProvider + Clone,
    A: IssuanceApi + Clone,
    L: IssuanceEventLog + Clone,
{
    /// Issuance service.
    pub issuer: Arc<IssuanceService<S, T, A, L>>,

    /// Key signing the browser-session cookie.
    pub cookie_key: Key,
}

impl<S, T, A, L> AppState<S, T, A, L>
where
    S: SessionStore + Clone,
    T: AccessTokenProvider + Clone,
    A: IssuanceApi + Clone,
    L: IssuanceEventLog + Clone,
{
    /// Create application state.
    ///
    /// The cookie signing key is derived from `cookie_secret`, so any secret
    /// length is accepted.
    #[must_use]
    pub fn new(issuer: IssuanceService<S, T, A, L>, cookie_secret: &str) -> Self {
        Self {
            issuer: Arc::new(issuer),
            cookie_key: derive_cookie_key(cookie_secret),
        }
    }
}

// Manual impl: the providers live behind the `Arc`.
impl<S, T, A, L> Clone for AppState<S, T, A, L>
where
    S: SessionStore + Clone,
    T: AccessTokenProvider + Clone,
    A: IssuanceApi + Clone,
    L: IssuanceEventLog + Clone,
{
    fn clone(&self) -> Self {
        Self {
            issuer: Arc::clone(&self.issuer),
            cookie_key: self.cookie_key.clone(),
        }
    }
}

/// Derive the 64-byte cookie key from a secret of arbitrary length.
#[must_use]
pub fn derive_cookie_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_key_is_deterministic() {
        let first = derive_cookie_key("short");
        let second = derive_cookie_key("short");
        let other = derive_cookie_key("different");

        assert_eq!(first.master(), second.master());
        assert_ne!(first.master(), other.master());
    }
}
