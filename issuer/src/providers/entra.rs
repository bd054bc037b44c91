//! Client-credential token provider for Microsoft Entra ID.

use crate::constants::{DEFAULT_AUTHORITY_HOST, DEFAULT_VERIFIED_ID_SCOPE};
use crate::error::{IssuerError, Result};
use crate::providers::{AccessToken, AccessTokenProvider};
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Tokens are refreshed this long before they expire.
const REFRESH_MARGIN_MINUTES: i64 = 5;

/// Upper bound applied to `expires_in` (one day).
const MAX_TOKEN_LIFETIME_SECS: i64 = 86_400;

/// Access token provider using the OAuth 2.0 client-credential grant.
///
/// Tokens are cached and reused until five minutes before expiry. The cache
/// lock is held across the refresh, so concurrent callers share one request
/// to the token endpoint.
///
/// # Example
///
/// ```no_run
/// use vc_issuer::providers::ClientCredentialTokenProvider;
///
/// let tokens = ClientCredentialTokenProvider::new(
///     "tenant-id".to_string(),
///     "client-id".to_string(),
///     "client-secret".to_string(),
/// );
/// ```
#[derive(Clone)]
pub struct ClientCredentialTokenProvider {
    /// Directory (tenant) id.
    tenant_id: String,

    /// Application (client) id.
    client_id: String,

    /// Client secret (keep confidential).
    client_secret: String,

    /// Requested scope.
    ///
    /// Default: the Verified ID request service `.default` scope
    scope: String,

    /// Authority host.
    ///
    /// Default: `https://login.microsoftonline.com`
    authority_host: String,

    /// HTTP client for making requests.
    http_client: Client,

    /// Last token handed out.
    cache: Arc<Mutex<Option<AccessToken>>>,
}

impl ClientCredentialTokenProvider {
    /// Create a new token provider.
    #[must_use]
    pub fn new(tenant_id: String, client_id: String, client_secret: String) -> Self {
        Self {
            tenant_id,
            client_id,
            client_secret,
            scope: DEFAULT_VERIFIED_ID_SCOPE.to_string(),
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            http_client: Client::new(),
            cache: Arc::new(Mutex::new(None)),
        }
    }

    /// Set the requested scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Set the authority host.
    #[must_use]
    pub fn with_authority_host(mut self, authority_host: impl Into<String>) -> Self {
        self.authority_host = authority_host.into();
        self
    }

    /// Token endpoint of the configured tenant.
    #[must_use]
    pub fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host.trim_end_matches('/'),
            self.tenant_id
        )
    }

    async fn request_token(&self) -> Result<AccessToken> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
            ("grant_type", "client_credentials"),
        ];

        let response = self
            .http_client
            .post(self.token_url())
            .form(&params)
            .send()
            .await
            .map_err(|e| IssuerError::TokenAcquisitionFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            tracing::error!(%status, "Token request failed: {}", error_body);
            return Err(IssuerError::TokenAcquisitionFailed(format!(
                "Token endpoint returned {status}"
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| IssuerError::TokenAcquisitionFailed(e.to_string()))?;

        let expires_in = token_response.expires_in.clamp(0, MAX_TOKEN_LIFETIME_SECS);
        let expires_at = Utc::now() + Duration::seconds(expires_in);

        Ok(AccessToken::new(token_response.access_token, expires_at))
    }
}

impl fmt::Debug for ClientCredentialTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentialTokenProvider")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scope", &self.scope)
            .field("authority_host", &self.authority_host)
            .finish_non_exhaustive()
    }
}

impl AccessTokenProvider for ClientCredentialTokenProvider {
    async fn acquire_token(&self) -> Result<AccessToken> {
        let mut cache = self.cache.lock().await;

        let margin = Duration::minutes(REFRESH_MARGIN_MINUTES);
        if let Some(token) = cache.as_ref().filter(|t| t.is_valid_for(margin, Utc::now())) {
            return Ok(token.clone());
        }

        tracing::debug!(tenant_id = %self.tenant_id, "Requesting new access token");
        let token = self.request_token().await?;
        *cache = Some(token.clone());

        Ok(token)
    }
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_url() {
        let provider = ClientCredentialTokenProvider::new(
            "tenant".to_string(),
            "client".to_string(),
            "secret".to_string(),
        );
        assert_eq!(
            provider.token_url(),
            "https://login.microsoftonline.com/tenant/oauth2/v2.0/token"
        );

        let provider = provider.with_authority_host("http://127.0.0.1:8080/");
        assert_eq!(
            provider.token_url(),
            "http://127.0.0.1:8080/tenant/oauth2/v2.0/token"
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let provider = ClientCredentialTokenProvider::new(
            "tenant".to_string(),
            "client".to_string(),
            "very-secret".to_string(),
        );

        let debug = format!("{provider:?}");
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("REDACTED"));
    }
}
