//! Axum middleware.
//!
//! - **Correlation ID**: every request gets an id, echoed in the response
//!   and recorded on the request span
//! - **Browser session**: resolves the signed session cookie to a live
//!   session, starting one when needed
//! - **CORS**: open to any origin
//!
//! # Example
//!
//! ```ignore
//! let app = Router::new()
//!     .route("/api/issuer/issuance-request", get(issuance_request))
//!     .route_layer(from_fn_with_state(state.clone(), browser_session))
//!     .layer(from_fn(correlation_id))
//!     .layer(cors_layer());
//! ```

use crate::error::AppError;
use crate::extractors::{BrowserSession, CorrelationId};
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue, Method, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use tower_http::cors::{Any, CorsLayer};
use tracing::Instrument;
use uuid::Uuid;
use vc_issuer::SessionId;
use vc_issuer::providers::{AccessTokenProvider, IssuanceApi, IssuanceEventLog, SessionStore};

/// Header name for correlation ID.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Name of the browser-session cookie.
pub const SESSION_COOKIE: &str = "vc_issuer.sid";

/// Tag the request with a correlation id.
///
/// Reuses a well-formed `X-Correlation-ID` header, otherwise generates one.
/// The id is stored in request extensions, attached to a tracing span
/// around the handler, and returned in the response header.
pub async fn correlation_id(mut request: Request, next: Next) -> Response {
    let correlation_id = request
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    request.extensions_mut().insert(CorrelationId(correlation_id));

    let span = tracing::info_span!(
        "http_request",
        correlation_id = %correlation_id,
        method = %request.method(),
        uri = %request.uri(),
    );

    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&correlation_id.to_string()) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }

    response
}

/// Resolve the browser session of the request.
///
/// Reads the signed session cookie and resumes the session it names. A new
/// session is started, and the cookie set on the response, when the cookie
/// is missing, tampered with, or names a session that no longer exists.
///
/// # Errors
///
/// Returns a 500 error if the session store fails.
pub async fn browser_session<S, T, A, L>(
    State(state): State<AppState<S, T, A, L>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError>
where
    S: SessionStore + Clone + 'static,
    T: AccessTokenProvider + Clone + 'static,
    A: IssuanceApi + Clone + 'static,
    L: IssuanceEventLog + Clone + 'static,
{
    let jar = SignedCookieJar::from_headers(request.headers(), state.cookie_key.clone());
    let existing = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| cookie.value().parse::<SessionId>().ok());

    let (session_id, created) = state.issuer.resume_or_start_session(existing).await?;
    request.extensions_mut().insert(BrowserSession(session_id));

    let response = next.run(request).await;

    if created {
        return Ok((jar.add(session_cookie(session_id)), response).into_response());
    }

    Ok(response)
}

fn session_cookie(session_id: SessionId) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// CORS policy: any origin, the methods the API uses, and the usual
/// browser request headers.
#[must_use]
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
            header::CONTENT_TYPE,
            header::ACCEPT,
        ])
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, middleware::from_fn, routing::get};
    use tower::ServiceExt;

    async fn echo_correlation_id(correlation_id: CorrelationId) -> String {
        correlation_id.0.to_string()
    }

    #[tokio::test]
    async fn test_correlation_id_generated_if_missing() {
        let app = Router::new()
            .route("/test", get(|| async { "ok" }))
            .layer(from_fn(correlation_id));

        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        let header = response
            .headers()
            .get(CORRELATION_ID_HEADER)
            .expect("Correlation ID header should be present");
        assert!(Uuid::parse_str(header.to_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_correlation_id_preserved_and_visible_to_handler() {
        let app = Router::new()
            .route("/test", get(echo_correlation_id))
            .layer(from_fn(correlation_id));

        let request_uuid = Uuid::new_v4();
        let request = Request::builder()
            .uri("/test")
            .header(CORRELATION_ID_HEADER, request_uuid.to_string())
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let header = response
            .headers()
            .get(CORRELATION_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert_eq!(header, request_uuid.to_string());

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, request_uuid.to_string());
    }

    #[tokio::test]
    async fn test_invalid_correlation_id_replaced() {
        let app = Router::new()
            .route("/test", get(|| async { "ok" }))
            .layer(from_fn(correlation_id));

        let request = Request::builder()
            .uri("/test")
            .header(CORRELATION_ID_HEADER, "not-a-uuid")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let header = response.headers().get(CORRELATION_ID_HEADER).unwrap();
        assert_ne!(header.to_str().unwrap(), "not-a-uuid");
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie(SessionId::new());

        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
    }
}
