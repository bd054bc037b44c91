//! Axum HTTP surface for the verifiable credential issuer.
//!
//! Wraps [`vc_issuer::IssuanceService`] in three endpoints plus a health
//! check. Handlers stay thin: extract, call the service, map the result.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              Axum (this crate)          │  ← HTTP, JSON, cookies
//! │  - Identity headers, browser session    │  ← CORS, tracing
//! │  - Error mapping                        │
//! ├─────────────────────────────────────────┤
//! │            IssuanceService              │
//! │  - Initiate, callback, poll             │  ← Session store
//! │  - Provider traits                      │  ← Token, issuance API, event log
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Routes
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET | `/health` | [`handlers::health_check`] |
//! | GET | `/api/issuer/issuance-request` | [`handlers::issuance_request`] |
//! | POST | `/api/issuer/issuance-request-callback` | [`handlers::issuance_callback`] |
//! | GET | `/api/issuer/issuance-response?id=` | [`handlers::issuance_response`] |
//!
//! # Example
//!
//! ```ignore
//! use vc_issuer_web::{AppState, build_router};
//!
//! let state = AppState::new(service, &config.cookie_secret);
//! let app = build_router(state);
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

// Re-export key types for convenience
pub use config::{Config, ConfigError, EventTableConfig};
pub use error::AppError;
pub use extractors::{AuthenticatedUser, BrowserSession, CorrelationId};
pub use middleware::{CORRELATION_ID_HEADER, SESSION_COOKIE};
pub use router::build_router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
