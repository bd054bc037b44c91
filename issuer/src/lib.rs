//! # Verifiable Credential Issuer
//!
//! This crate implements the issuance flow of a verifiable credential (VC)
//! against an external identity-verification service.
//!
//! ## Flow
//!
//! ```text
//! Browser                 IssuanceService                 External service
//!   │  initiate_issuance      │                                 │
//!   │────────────────────────▶│ session.data = Pending          │
//!   │                         │ acquire token ─────────────────▶│
//!   │                         │ createIssuanceRequest ─────────▶│
//!   │◀──── {url, id, pin} ────│                                 │
//!   │                         │◀──── callback(state = id) ──────│
//!   │                         │ session.data = Retrieved/...    │
//!   │  get_status(id)         │                                 │
//!   │────────────────────────▶│                                 │
//!   │◀──── SessionData ───────│                                 │
//! ```
//!
//! The callback and the poller never talk to each other directly: they
//! correlate through the [`providers::SessionStore`], keyed by the
//! [`SessionId`] threaded through the external service as callback state.
//!
//! ## Dependency Injection
//!
//! Every external collaborator is a provider trait (session store, token
//! provider, issuance API, event log). Production implementations live in
//! [`providers`] and [`stores`]; in-memory mocks live in `mocks` (feature
//! `test-utils`).

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod callback;
pub mod config;
pub mod constants;
pub mod environment;
pub mod error;
pub mod pin;
pub mod providers;
pub mod request;
pub mod service;
pub mod state;
pub mod stores;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main types for convenience
pub use callback::CallbackPayload;
pub use config::IssuanceConfig;
pub use environment::IssuerEnvironment;
pub use error::{IssuerError, Result};
pub use request::IssuanceRequest;
pub use service::{CallbackOutcome, IssuanceInitiated, IssuanceService, StatusLookup};
pub use state::{IssuanceStatus, Session, SessionData, SessionId, UserClaims};
