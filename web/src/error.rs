//! Error types for web handlers.
//!
//! Bridges [`IssuerError`] and HTTP responses. Every error renders as
//!
//! ```json
//! { "error": "human-readable message", "code": "MACHINE_CODE" }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;
use vc_issuer::IssuerError;

/// Message returned when no access token could be acquired.
pub const TOKEN_FAILURE_MESSAGE: &str =
    "Could not acquire credentials to access the issuance service";

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler() -> Result<Json<Data>, AppError> {
///     let user = identity(&headers).ok_or_else(|| AppError::unauthorized("Sign in first"))?;
///     Ok(Json(data))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Attach the underlying error (logged, never sent to the client).
    #[must_use]
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "BAD_REQUEST".to_string(),
        )
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            message.into(),
            "UNAUTHORIZED".to_string(),
        )
    }

    /// Create a 502 Bad Gateway error with a specific code.
    #[must_use]
    pub fn bad_gateway(message: impl Into<String>, code: &str) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message.into(), code.to_string())
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }

    /// HTTP status of the error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Human-readable error message.
    error: String,
    /// Error code (for client error handling).
    code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Request failed"
                ),
                None => tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Request failed"
                ),
            }
        }

        let body = ErrorResponse {
            error: self.message,
            code: self.code,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<IssuerError> for AppError {
    fn from(err: IssuerError) -> Self {
        let mapped = match &err {
            IssuerError::TokenAcquisitionFailed(_) => Self::unauthorized(TOKEN_FAILURE_MESSAGE),
            IssuerError::IssuanceApiUnavailable(_) => Self::bad_gateway(
                "The issuance service could not be reached",
                "ISSUANCE_API_UNAVAILABLE",
            ),
            IssuerError::IssuanceApiRejected { message, .. } => {
                Self::bad_gateway(message.clone(), "ISSUANCE_API_REJECTED")
            }
            _ => Self::internal("An internal error occurred"),
        };

        mapped.with_source(err)
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[test]
    fn test_token_failure_is_unauthorized() {
        let err = AppError::from(IssuerError::TokenAcquisitionFailed("AADSTS7000215".to_string()));
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.message, TOKEN_FAILURE_MESSAGE);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_transport_and_rejection_are_distinct() {
        let unavailable = AppError::from(IssuerError::IssuanceApiUnavailable("timeout".to_string()));
        assert_eq!(unavailable.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(unavailable.code(), "ISSUANCE_API_UNAVAILABLE");

        let rejected = AppError::from(IssuerError::IssuanceApiRejected {
            status: 400,
            code: "badRequest".to_string(),
            message: "The request is invalid.".to_string(),
        });
        assert_eq!(rejected.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(rejected.code(), "ISSUANCE_API_REJECTED");
        assert_eq!(rejected.message, "The request is invalid.");
    }

    #[test]
    fn test_local_errors_are_internal() {
        let err = AppError::from(IssuerError::SessionStoreError("poisoned".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "An internal error occurred");
    }
}
