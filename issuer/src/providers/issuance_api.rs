//! Issuance API trait.

use crate::error::Result;
use crate::request::IssuanceRequest;
use serde_json::{Map, Value};

/// External issuance REST API (`createIssuanceRequest`).
pub trait IssuanceApi: Send + Sync {
    /// Submit an issuance request.
    ///
    /// # Returns
    ///
    /// The raw JSON object returned by the API (request id, wallet URL,
    /// QR code, expiry).
    ///
    /// # Errors
    ///
    /// - [`crate::IssuerError::IssuanceApiUnavailable`] on transport or
    ///   decoding failure
    /// - [`crate::IssuerError::IssuanceApiRejected`] when the API answers
    ///   with an error payload
    fn create_issuance_request(
        &self,
        access_token: &str,
        request: &IssuanceRequest,
    ) -> impl std::future::Future<Output = Result<Map<String, Value>>> + Send;
}
