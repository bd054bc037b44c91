//! Issuance providers.
//!
//! This module defines traits for every external collaborator of the
//! issuance flow, plus the HTTP-backed production implementations.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   acquire_token   ┌──────────────────────────┐
//! │ IssuanceService  │──────────────────▶│ AccessTokenProvider      │
//! │                  │                   │ (client-credential grant)│
//! │  initiate        │  create request   ├──────────────────────────┤
//! │  callback        │──────────────────▶│ IssuanceApi              │
//! │  poll            │                   ├──────────────────────────┤
//! │                  │   get / set       │ SessionStore             │
//! │                  │──────────────────▶│ (shared by all handlers) │
//! │                  │   record          ├──────────────────────────┤
//! │                  │──────────────────▶│ IssuanceEventLog         │
//! └──────────────────┘                   └──────────────────────────┘
//! ```
//!
//! Mocks for every trait live in `crate::mocks`.

pub mod entra;
pub mod event_log;
pub mod issuance_api;
pub mod session;
pub mod table_storage;
pub mod token;
pub mod verified_id;

// Re-export provider traits
pub use entra::ClientCredentialTokenProvider;
pub use event_log::{IssuanceEvent, IssuanceEventLog};
pub use issuance_api::IssuanceApi;
pub use session::SessionStore;
pub use table_storage::TableStorageEventLog;
pub use token::{AccessToken, AccessTokenProvider};
pub use verified_id::VerifiedIdClient;
