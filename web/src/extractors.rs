//! Custom Axum extractors.
//!
//! - `CorrelationId`: request correlation id (set by the middleware, or
//!   read from `X-Correlation-ID`, or generated)
//! - `AuthenticatedUser`: identity asserted by the authenticating proxy
//! - `BrowserSession`: session id resolved by the browser-session layer
//!
//! # Examples
//!
//! ```ignore
//! async fn handler(
//!     correlation_id: CorrelationId,
//!     session: BrowserSession,
//!     AuthenticatedUser(user): AuthenticatedUser,
//! ) -> Result<Json<Response>, AppError> {
//!     tracing::info!(
//!         correlation_id = %correlation_id.0,
//!         session_id = %session.0,
//!         email = %user.email,
//!         "Processing request"
//!     );
//!     Ok(Json(response))
//! }
//! ```

use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use uuid::Uuid;
use vc_issuer::{SessionId, UserClaims};

/// Header carrying the signed-in user's email.
pub const EMAIL_HEADER: &str = "X-Forwarded-Email";

/// Header carrying the signed-in user's display name.
pub const PREFERRED_USERNAME_HEADER: &str = "X-Forwarded-Preferred-Username";

/// Fallback header for the display name.
pub const USER_HEADER: &str = "X-Forwarded-User";

/// Correlation ID for request tracing.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<Self>() {
            return Ok(*id);
        }

        let correlation_id = parts
            .headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}

/// Signed-in user.
///
/// Authentication happens upstream: an authenticating reverse proxy asserts
/// the identity in trusted headers. The email is required; the display name
/// falls back to the username header, then to the email.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_from_headers(&parts.headers)
            .map(Self)
            .ok_or_else(|| AppError::unauthorized("Sign in to request a credential"))
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn user_from_headers(headers: &HeaderMap) -> Option<UserClaims> {
    let email = header_value(headers, EMAIL_HEADER)?;
    let name = header_value(headers, PREFERRED_USERNAME_HEADER)
        .or_else(|| header_value(headers, USER_HEADER))
        .unwrap_or(email);

    Some(UserClaims::new(email, name))
}

/// Browser session of the current request.
///
/// Only available on routes wrapped by
/// [`crate::middleware::browser_session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowserSession(pub SessionId);

#[async_trait]
impl<S> FromRequestParts<S> for BrowserSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .copied()
            .ok_or_else(|| AppError::internal("Browser session layer not installed"))
    }
}
