//! Health check endpoint.
//!
//! Used by load balancers and monitoring systems to verify the process is
//! up. Does not probe the external services.

use axum::{Json, http::StatusCode};
use serde::Serialize;

/// Health check response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
}

/// Simple health check endpoint (for basic liveness).
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "ok",
///   "version": "0.1.0"
/// }
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
