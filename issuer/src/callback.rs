//! Inbound callback payload of the issuance service.

use crate::constants::MESSAGE_ISSUANCE_FAILED;
use crate::error::{IssuerError, Result};
use crate::state::{IssuanceStatus, SessionData, SessionId};
use serde::{Deserialize, Serialize};

/// Request lifecycle event posted by the issuance service.
///
/// ```json
/// {
///   "requestId": "799f23ea-5241-45af-99ad-cf8e5018814e",
///   "requestStatus": "issuance_error",
///   "state": "de19cb6b-36c1-45ea-9a2e-cdc7d8b5a89c",
///   "error": { "code": "IssuanceFlowFailed", "message": "Failed to sign the credential" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackPayload {
    /// Request id assigned by the service.
    #[serde(default)]
    pub request_id: Option<String>,

    /// Lifecycle code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_status: Option<String>,

    /// Lifecycle code of older payloads, used when `requestStatus` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Correlation token, the session id used at initiation.
    #[serde(default)]
    pub state: String,

    /// Error details for `issuance_error`.
    #[serde(default)]
    pub error: Option<CallbackError>,
}

/// Error details of a failed issuance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackError {
    /// Machine-readable error code.
    #[serde(default)]
    pub code: Option<String>,

    /// Human-readable error message.
    #[serde(default)]
    pub message: Option<String>,
}

impl CallbackPayload {
    /// Parse a raw callback body.
    ///
    /// # Errors
    ///
    /// Returns [`IssuerError::InternalError`] if the body is not a callback
    /// payload or carries neither `requestStatus` nor `code`.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let payload: Self = serde_json::from_slice(body)
            .map_err(|e| IssuerError::InternalError(format!("Malformed callback payload: {e}")))?;

        if payload.lifecycle_code().is_none() {
            return Err(IssuerError::InternalError(
                "Malformed callback payload: missing requestStatus".to_string(),
            ));
        }

        Ok(payload)
    }

    /// Lifecycle code, `requestStatus` taking precedence over `code`.
    #[must_use]
    pub fn lifecycle_code(&self) -> Option<&str> {
        self.request_status.as_deref().or(self.code.as_deref())
    }

    /// Status carried by the callback, if it is one that updates the session.
    #[must_use]
    pub fn status(&self) -> Option<IssuanceStatus> {
        self.lifecycle_code()
            .and_then(IssuanceStatus::from_callback_code)
    }

    /// Session the callback refers to, if the state token is well formed.
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.state.parse().ok()
    }

    /// Status record to store for this callback.
    ///
    /// Returns `None` for codes that must not update the session.
    #[must_use]
    pub fn session_data(&self) -> Option<SessionData> {
        match self.status()? {
            IssuanceStatus::RequestRetrieved => Some(SessionData::request_retrieved()),
            IssuanceStatus::IssuanceSuccessful => Some(SessionData::issuance_successful()),
            IssuanceStatus::IssuanceError => Some(SessionData::issuance_error(self.error_message())),
            IssuanceStatus::Pending => None,
        }
    }

    fn error_message(&self) -> String {
        self.error
            .as_ref()
            .and_then(|error| error.message.clone().or_else(|| error.code.clone()))
            .unwrap_or_else(|| MESSAGE_ISSUANCE_FAILED.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_request_retrieved_maps_to_scanned_message() {
        let payload = CallbackPayload::from_slice(
            br#"{"requestId":"r1","requestStatus":"request_retrieved","state":"s"}"#,
        )
        .unwrap();

        assert_eq!(payload.session_data(), Some(SessionData::request_retrieved()));
    }

    #[test]
    fn test_legacy_code_field_accepted() {
        let payload =
            CallbackPayload::from_slice(br#"{"code":"issuance_successful","state":"s"}"#).unwrap();

        assert_eq!(payload.status(), Some(IssuanceStatus::IssuanceSuccessful));
        assert_eq!(payload.session_data(), Some(SessionData::issuance_successful()));
    }

    #[test]
    fn test_request_status_and_code_together() {
        let id = SessionId::new();
        let body = format!(
            r#"{{"requestStatus":"request_retrieved","code":"request_retrieved","state":"{id}"}}"#
        );

        let payload = CallbackPayload::from_slice(body.as_bytes()).unwrap();

        assert_eq!(payload.session_id(), Some(id));
        assert_eq!(payload.session_data(), Some(SessionData::request_retrieved()));
    }

    #[test]
    fn test_request_status_takes_precedence_over_code() {
        let payload = CallbackPayload::from_slice(
            br#"{"requestStatus":"issuance_successful","code":"request_retrieved","state":"s"}"#,
        )
        .unwrap();

        assert_eq!(payload.lifecycle_code(), Some("issuance_successful"));
        assert_eq!(payload.status(), Some(IssuanceStatus::IssuanceSuccessful));
    }

    #[test]
    fn test_issuance_error_uses_service_message() {
        let payload = CallbackPayload::from_slice(
            br#"{"requestStatus":"issuance_error","state":"s","error":{"code":"E1","message":"X"}}"#,
        )
        .unwrap();

        let data = payload.session_data().unwrap();
        assert_eq!(data.status, IssuanceStatus::IssuanceError);
        assert_eq!(data.message, "X");
    }

    #[test]
    fn test_issuance_error_message_fallbacks() {
        let code_only = CallbackPayload::from_slice(
            br#"{"requestStatus":"issuance_error","state":"s","error":{"code":"E1"}}"#,
        )
        .unwrap();
        assert_eq!(code_only.session_data().unwrap().message, "E1");

        let bare =
            CallbackPayload::from_slice(br#"{"requestStatus":"issuance_error","state":"s"}"#)
                .unwrap();
        assert_eq!(bare.session_data().unwrap().message, "Credential issuance failed");
    }

    #[test]
    fn test_unknown_status_produces_no_update() {
        let payload =
            CallbackPayload::from_slice(br#"{"requestStatus":"presentation_verified","state":"s"}"#)
                .unwrap();

        assert!(payload.status().is_none());
        assert!(payload.session_data().is_none());
    }

    #[test]
    fn test_session_id_from_state() {
        let id = SessionId::new();
        let payload = CallbackPayload {
            request_id: None,
            request_status: Some("request_retrieved".to_string()),
            code: None,
            state: id.to_string(),
            error: None,
        };
        assert_eq!(payload.session_id(), Some(id));

        let foreign = CallbackPayload {
            state: "opaque-token".to_string(),
            ..payload
        };
        assert!(foreign.session_id().is_none());
    }

    #[test]
    fn test_malformed_body_rejected() {
        assert!(CallbackPayload::from_slice(b"not json").is_err());
        assert!(CallbackPayload::from_slice(br#"{"state":"s"}"#).is_err());
    }
}
