//! Issuance session state types.
//!
//! A [`Session`] is the unit the session store keeps per browser session.
//! Its [`SessionData`] is the status record the polling client reads and
//! the callback receiver replaces.

use crate::constants::{
    MESSAGE_ISSUANCE_SUCCESSFUL, MESSAGE_PENDING, MESSAGE_REQUEST_RETRIEVED,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ═══════════════════════════════════════════════════════════════════════
// ID Types
// ═══════════════════════════════════════════════════════════════════════

/// Unique identifier for a session.
///
/// Doubles as the callback state token handed to the issuance service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub uuid::Uuid);

impl SessionId {
    /// Generate a new random `SessionId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s.trim()).map(Self)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Status
// ═══════════════════════════════════════════════════════════════════════

/// Lifecycle status of an issuance request.
///
/// `Pending` is set locally on initiation; the other variants mirror the
/// `requestStatus` codes sent by the issuance service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssuanceStatus {
    /// Request created, QR code not scanned yet.
    Pending,
    /// The wallet fetched the issuance request.
    RequestRetrieved,
    /// The credential was issued to the wallet.
    IssuanceSuccessful,
    /// Issuance failed.
    IssuanceError,
}

impl IssuanceStatus {
    /// Map an external callback code to a status.
    ///
    /// Returns `None` for codes that must not touch the session.
    #[must_use]
    pub fn from_callback_code(code: &str) -> Option<Self> {
        match code {
            "request_retrieved" => Some(Self::RequestRetrieved),
            "issuance_successful" => Some(Self::IssuanceSuccessful),
            "issuance_error" => Some(Self::IssuanceError),
            _ => None,
        }
    }

    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::RequestRetrieved => "request_retrieved",
            Self::IssuanceSuccessful => "issuance_successful",
            Self::IssuanceError => "issuance_error",
        }
    }

    /// Returns `true` once no further callback is expected.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::IssuanceSuccessful | Self::IssuanceError)
    }
}

impl fmt::Display for IssuanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status record shown to the polling client.
///
/// Always replaced wholesale. The constructors keep `message` consistent
/// with `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    /// Current status.
    pub status: IssuanceStatus,

    /// Human-readable text for the UI.
    pub message: String,
}

impl SessionData {
    /// Initial record written when an issuance request is initiated.
    #[must_use]
    pub fn pending() -> Self {
        Self {
            status: IssuanceStatus::Pending,
            message: MESSAGE_PENDING.to_string(),
        }
    }

    /// Record for a scanned QR code.
    #[must_use]
    pub fn request_retrieved() -> Self {
        Self {
            status: IssuanceStatus::RequestRetrieved,
            message: MESSAGE_REQUEST_RETRIEVED.to_string(),
        }
    }

    /// Record for a successful issuance.
    #[must_use]
    pub fn issuance_successful() -> Self {
        Self {
            status: IssuanceStatus::IssuanceSuccessful,
            message: MESSAGE_ISSUANCE_SUCCESSFUL.to_string(),
        }
    }

    /// Record for a failed issuance, carrying the service's error message.
    #[must_use]
    pub fn issuance_error(message: impl Into<String>) -> Self {
        Self {
            status: IssuanceStatus::IssuanceError,
            message: message.into(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Session
// ═══════════════════════════════════════════════════════════════════════

/// Identity claims of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    /// Email address.
    pub email: String,

    /// Display name.
    pub name: String,
}

impl UserClaims {
    /// Create user claims.
    #[must_use]
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
        }
    }
}

/// Browser session.
///
/// Created by the web session layer on first contact. `session_data` stays
/// `None` until an issuance request is initiated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier.
    pub session_id: SessionId,

    /// Session creation timestamp.
    pub created_at: DateTime<Utc>,

    /// User that initiated issuance (set by the initiator).
    pub user: Option<UserClaims>,

    /// Issuance status record.
    pub session_data: Option<SessionData>,
}

impl Session {
    /// Create an empty session.
    #[must_use]
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            created_at: Utc::now(),
            user: None,
            session_data: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_codes_map_to_statuses() {
        assert_eq!(
            IssuanceStatus::from_callback_code("request_retrieved"),
            Some(IssuanceStatus::RequestRetrieved)
        );
        assert_eq!(
            IssuanceStatus::from_callback_code("issuance_successful"),
            Some(IssuanceStatus::IssuanceSuccessful)
        );
        assert_eq!(
            IssuanceStatus::from_callback_code("issuance_error"),
            Some(IssuanceStatus::IssuanceError)
        );
        assert_eq!(IssuanceStatus::from_callback_code("presentation_verified"), None);
        assert_eq!(IssuanceStatus::from_callback_code("pending"), None);
    }

    #[test]
    fn test_session_data_serializes_snake_case_status() {
        let json = serde_json::to_value(SessionData::request_retrieved()).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "status": "request_retrieved",
                "message": "QR Code is scanned. Waiting for issuance to complete..."
            })
        );
        assert_eq!(
            serde_json::to_value(SessionData::pending()).unwrap()["status"],
            "pending"
        );
    }

    #[test]
    fn test_session_id_parses_its_display_form() {
        let id = SessionId::new();
        let parsed: SessionId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-session".parse::<SessionId>().is_err());
    }

    #[test]
    fn test_new_session_has_no_data() {
        let session = Session::new(SessionId::new());
        assert!(session.session_data.is_none());
        assert!(session.user.is_none());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(IssuanceStatus::IssuanceSuccessful.is_terminal());
        assert!(IssuanceStatus::IssuanceError.is_terminal());
        assert!(!IssuanceStatus::Pending.is_terminal());
        assert!(!IssuanceStatus::RequestRetrieved.is_terminal());
    }
}
