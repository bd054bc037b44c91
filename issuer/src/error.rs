//! Error types for credential issuance operations.

use thiserror::Error;

/// Result type alias for issuance operations.
pub type Result<T> = std::result::Result<T, IssuerError>;

/// Error taxonomy for the issuance flow.
///
/// External failures are split by where they happened: the token endpoint,
/// the transport to the issuance API, or an error payload returned by the
/// issuance API itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IssuerError {
    // ═══════════════════════════════════════════════════════════
    // Authorization
    // ═══════════════════════════════════════════════════════════

    /// Access token could not be acquired from the token provider.
    #[error("Failed to acquire access token: {0}")]
    TokenAcquisitionFailed(String),

    // ═══════════════════════════════════════════════════════════
    // Issuance API
    // ═══════════════════════════════════════════════════════════

    /// The issuance API could not be reached or its response could not be read.
    #[error("Issuance API unavailable: {0}")]
    IssuanceApiUnavailable(String),

    /// The issuance API answered with an error payload.
    #[error("Issuance API rejected the request ({status}): {code}: {message}")]
    IssuanceApiRejected {
        /// HTTP status returned by the API.
        status: u16,
        /// Error code from the API payload.
        code: String,
        /// Error message from the API payload.
        message: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Request construction
    // ═══════════════════════════════════════════════════════════

    /// The issuance request template is malformed.
    #[error("Invalid issuance request template: {0}")]
    InvalidTemplate(String),

    /// Requested PIN length cannot be represented.
    #[error("Invalid PIN length {0}: must be between 1 and 19 digits")]
    InvalidPinLength(u8),

    // ═══════════════════════════════════════════════════════════
    // Storage
    // ═══════════════════════════════════════════════════════════

    /// Session store operation failed.
    #[error("Session store error: {0}")]
    SessionStoreError(String),

    /// Issuance event could not be appended to the event log.
    #[error("Failed to record issuance event: {0}")]
    EventLogFailed(String),

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Internal error (should not be exposed to users).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl IssuerError {
    /// Returns `true` if the error originated in an external service.
    ///
    /// # Examples
    ///
    /// ```
    /// # use vc_issuer::IssuerError;
    /// assert!(IssuerError::IssuanceApiUnavailable("timeout".into()).is_upstream_error());
    /// assert!(!IssuerError::InvalidPinLength(0).is_upstream_error());
    /// ```
    #[must_use]
    pub const fn is_upstream_error(&self) -> bool {
        matches!(
            self,
            Self::TokenAcquisitionFailed(_)
                | Self::IssuanceApiUnavailable(_)
                | Self::IssuanceApiRejected { .. }
                | Self::EventLogFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_display_includes_api_details() {
        let err = IssuerError::IssuanceApiRejected {
            status: 400,
            code: "badRequest".to_string(),
            message: "The request is invalid".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "Issuance API rejected the request (400): badRequest: The request is invalid"
        );
        assert!(err.is_upstream_error());
    }

    #[test]
    fn test_local_errors_are_not_upstream() {
        assert!(!IssuerError::SessionStoreError("poisoned".to_string()).is_upstream_error());
        assert!(!IssuerError::InvalidTemplate("missing claims".to_string()).is_upstream_error());
    }
}
