//! Router configuration for the issuer.
//!
//! Builds the complete Axum router with all endpoints.

use crate::handlers::{health_check, issuance_callback, issuance_request, issuance_response};
use crate::middleware::{browser_session, correlation_id, cors_layer};
use crate::state::AppState;
use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use vc_issuer::constants::CALLBACK_PATH;
use vc_issuer::providers::{AccessTokenProvider, IssuanceApi, IssuanceEventLog, SessionStore};

/// Path of the issuance request endpoint.
pub const ISSUANCE_REQUEST_PATH: &str = "/api/issuer/issuance-request";

/// Path of the status polling endpoint.
pub const ISSUANCE_RESPONSE_PATH: &str = "/api/issuer/issuance-response";

/// Build the complete Axum router.
///
/// Only the issuance request route sits behind the browser-session layer;
/// the callback comes from the issuance service and the poll names its
/// session explicitly.
///
/// # Arguments
///
/// - `state`: Application state to share with handlers
///
/// # Returns
///
/// Configured Axum router ready to serve requests.
pub fn build_router<S, T, A, L>(state: AppState<S, T, A, L>) -> Router
where
    S: SessionStore + Clone + 'static,
    T: AccessTokenProvider + Clone + 'static,
    A: IssuanceApi + Clone + 'static,
    L: IssuanceEventLog + Clone + 'static,
{
    let browser_routes = Router::new()
        .route(ISSUANCE_REQUEST_PATH, get(issuance_request::<S, T, A, L>))
        .route_layer(from_fn_with_state(
            state.clone(),
            browser_session::<S, T, A, L>,
        ));

    Router::new()
        // Health check (no session, no identity)
        .route("/health", get(health_check))
        // Issuance service callbacks
        .route(CALLBACK_PATH, post(issuance_callback::<S, T, A, L>))
        // Status polling
        .route(ISSUANCE_RESPONSE_PATH, get(issuance_response::<S, T, A, L>))
        .merge(browser_routes)
        .layer(from_fn(correlation_id))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}
