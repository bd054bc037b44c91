//! Mock issuance API for testing.

use crate::error::{IssuerError, Result};
use crate::providers::IssuanceApi;
use crate::request::IssuanceRequest;
use serde_json::{Map, Value, json};
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Request captured by [`MockIssuanceApi`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// Bearer token the request was sent with.
    pub access_token: String,

    /// Request body.
    pub request: IssuanceRequest,
}

/// Mock issuance API.
///
/// Records every request and answers with a canned response or error.
#[derive(Debug, Clone)]
pub struct MockIssuanceApi {
    response: Map<String, Value>,
    error: Option<IssuerError>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockIssuanceApi {
    /// Create a mock API answering like the real service.
    #[must_use]
    pub fn new() -> Self {
        let response = json!({
            "requestId": "mock-request-id",
            "url": "openid-vc://?request_uri=https://verifiedid.example/request/mock-request-id",
            "expiry": 1_700_000_000,
            "qrCode": "data:image/png;base64,iVBORw0KGgo="
        });

        Self {
            response: response.as_object().cloned().unwrap_or_default(),
            error: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answer with `response` instead.
    #[must_use]
    pub fn with_response(mut self, response: Map<String, Value>) -> Self {
        self.response = response;
        self
    }

    /// Fail every call with `error`.
    #[must_use]
    pub fn with_error(mut self, error: IssuerError) -> Self {
        self.error = Some(error);
        self
    }

    /// Requests received so far.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn requests(&self) -> Result<Vec<RecordedRequest>> {
        Ok(self
            .requests
            .lock()
            .map_err(|_| IssuerError::InternalError("Mutex lock failed".to_string()))?
            .clone())
    }
}

impl Default for MockIssuanceApi {
    fn default() -> Self {
        Self::new()
    }
}

impl IssuanceApi for MockIssuanceApi {
    fn create_issuance_request(
        &self,
        access_token: &str,
        request: &IssuanceRequest,
    ) -> impl Future<Output = Result<Map<String, Value>>> + Send {
        let requests = Arc::clone(&self.requests);
        let recorded = RecordedRequest {
            access_token: access_token.to_string(),
            request: request.clone(),
        };
        let outcome = self.error.clone().map_or_else(|| Ok(self.response.clone()), Err);

        async move {
            requests
                .lock()
                .map_err(|_| IssuerError::InternalError("Mutex lock failed".to_string()))?
                .push(recorded);
            outcome
        }
    }
}
