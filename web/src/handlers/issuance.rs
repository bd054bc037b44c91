//! Issuance handlers.
//!
//! - `issuance_request`: start an issuance for the signed-in user
//! - `issuance_callback`: lifecycle events from the issuance service
//! - `issuance_response`: status polling by the browser

use crate::error::AppError;
use crate::extractors::{AuthenticatedUser, BrowserSession, CorrelationId};
use crate::state::AppState;
use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Map, Value};
use vc_issuer::constants::CALLBACK_API_KEY_HEADER;
use vc_issuer::providers::{AccessTokenProvider, IssuanceApi, IssuanceEventLog, SessionStore};
use vc_issuer::{CallbackPayload, SessionId, StatusLookup};

/// Query parameters of the status endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusQuery {
    /// Session id returned by the issuance request.
    pub id: Option<String>,
}

/// Start an issuance request.
///
/// # Endpoint
///
/// ```text
/// GET /api/issuer/issuance-request
/// ```
///
/// # Response
///
/// The issuance service's response, plus the session id to poll with and
/// the PIN to show the user when one is required:
///
/// ```json
/// {
///   "requestId": "...",
///   "url": "openid-vc://?request_uri=...",
///   "expiry": 1700000000,
///   "id": "0b5e2f4e-...",
///   "pin": "4821"
/// }
/// ```
///
/// # Errors
///
/// - 401 if the caller is not signed in or no access token could be acquired
/// - 502 if the issuance service is unreachable or rejects the request
pub async fn issuance_request<S, T, A, L>(
    State(state): State<AppState<S, T, A, L>>,
    correlation_id: CorrelationId,
    BrowserSession(session_id): BrowserSession,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Map<String, Value>>, AppError>
where
    S: SessionStore + Clone + 'static,
    T: AccessTokenProvider + Clone + 'static,
    A: IssuanceApi + Clone + 'static,
    L: IssuanceEventLog + Clone + 'static,
{
    tracing::info!(
        correlation_id = %correlation_id.0,
        %session_id,
        email = %user.email,
        "Issuance requested"
    );

    let initiated = state.issuer.initiate_issuance(session_id, &user).await?;

    Ok(Json(initiated.body))
}

/// Receive a callback from the issuance service.
///
/// # Endpoint
///
/// ```text
/// POST /api/issuer/issuance-request-callback
/// ```
///
/// # Response
///
/// Always `200 OK` with an empty body, so the issuance service never
/// retries. Malformed payloads, unknown sessions and store failures are
/// logged.
pub async fn issuance_callback<S, T, A, L>(
    State(state): State<AppState<S, T, A, L>>,
    correlation_id: CorrelationId,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode
where
    S: SessionStore + Clone + 'static,
    T: AccessTokenProvider + Clone + 'static,
    A: IssuanceApi + Clone + 'static,
    L: IssuanceEventLog + Clone + 'static,
{
    let payload = match CallbackPayload::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(
                correlation_id = %correlation_id.0,
                error = %e,
                body_len = body.len(),
                "Ignoring malformed callback"
            );
            return StatusCode::OK;
        }
    };

    let api_key = headers
        .get(CALLBACK_API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match state.issuer.handle_callback(&payload, api_key).await {
        Ok(outcome) => tracing::debug!(
            correlation_id = %correlation_id.0,
            state = %payload.state,
            request_status = payload.lifecycle_code().unwrap_or_default(),
            outcome = outcome.as_str(),
            "Callback processed"
        ),
        Err(e) => tracing::error!(
            correlation_id = %correlation_id.0,
            state = %payload.state,
            error = %e,
            "Callback processing failed"
        ),
    }

    StatusCode::OK
}

/// Poll the status of an issuance.
///
/// # Endpoint
///
/// ```text
/// GET /api/issuer/issuance-response?id=<session id>
/// ```
///
/// # Response
///
/// `200 OK` with the session's status record:
///
/// ```json
/// { "status": "request_retrieved", "message": "QR Code is scanned. Waiting for issuance to complete..." }
/// ```
///
/// `204 No Content` when the session is unknown or has not started an
/// issuance yet.
///
/// # Errors
///
/// Returns 500 if the session store fails.
pub async fn issuance_response<S, T, A, L>(
    State(state): State<AppState<S, T, A, L>>,
    correlation_id: CorrelationId,
    Query(query): Query<StatusQuery>,
) -> Result<Response, AppError>
where
    S: SessionStore + Clone + 'static,
    T: AccessTokenProvider + Clone + 'static,
    A: IssuanceApi + Clone + 'static,
    L: IssuanceEventLog + Clone + 'static,
{
    let Some(session_id) = query
        .id
        .as_deref()
        .and_then(|id| id.parse::<SessionId>().ok())
    else {
        tracing::debug!(
            correlation_id = %correlation_id.0,
            id = ?query.id,
            "Status poll without a valid session id"
        );
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    match state.issuer.get_status(session_id).await? {
        StatusLookup::Found(data) => Ok(Json(data).into_response()),
        StatusLookup::NotInitiated => {
            tracing::debug!(%session_id, "Status poll before issuance was requested");
            Ok(StatusCode::NO_CONTENT.into_response())
        }
        StatusLookup::UnknownSession => {
            tracing::debug!(%session_id, "Status poll for unknown session");
            Ok(StatusCode::NO_CONTENT.into_response())
        }
    }
}
