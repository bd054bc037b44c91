//! Microsoft Entra Verified ID request service client.

use crate::constants::DEFAULT_ISSUANCE_ENDPOINT;
use crate::error::{IssuerError, Result};
use crate::providers::IssuanceApi;
use crate::request::IssuanceRequest;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Verified ID `createIssuanceRequest` client.
///
/// Transport failures and application-level error payloads are reported as
/// distinct errors:
///
/// | Situation                              | Error                     |
/// |----------------------------------------|---------------------------|
/// | connect / timeout / unreadable body     | `IssuanceApiUnavailable`  |
/// | non-2xx answer with an error payload    | `IssuanceApiRejected`     |
#[derive(Clone, Debug)]
pub struct VerifiedIdClient {
    /// `createIssuanceRequest` endpoint.
    endpoint: String,

    /// HTTP client for making requests.
    http_client: Client,
}

impl VerifiedIdClient {
    /// Create a client for the public Verified ID endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ISSUANCE_ENDPOINT.to_string(),
            http_client: Client::new(),
        }
    }

    /// Override the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Configured endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for VerifiedIdClient {
    fn default() -> Self {
        Self::new()
    }
}

impl IssuanceApi for VerifiedIdClient {
    async fn create_issuance_request(
        &self,
        access_token: &str,
        request: &IssuanceRequest,
    ) -> Result<Map<String, Value>> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(access_token)
            .json(request)
            .send()
            .await
            .map_err(|e| IssuerError::IssuanceApiUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            tracing::error!(%status, "Issuance request rejected: {}", error_body);

            let (code, message) = serde_json::from_str::<ErrorResponse>(&error_body)
                .map(|payload| (payload.error.code, payload.error.message))
                .unwrap_or_else(|_| {
                    (
                        status.canonical_reason().unwrap_or("unknown").to_string(),
                        error_body,
                    )
                });

            return Err(IssuerError::IssuanceApiRejected {
                status: status.as_u16(),
                code,
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| IssuerError::IssuanceApiUnavailable(format!("Unreadable response: {e}")))
    }
}

/// Error payload of the request service.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        let client = VerifiedIdClient::new();
        assert_eq!(client.endpoint(), DEFAULT_ISSUANCE_ENDPOINT);

        let client = client.with_endpoint("http://127.0.0.1:9000/issue");
        assert_eq!(client.endpoint(), "http://127.0.0.1:9000/issue");
    }
}
