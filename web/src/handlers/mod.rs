//! HTTP request handlers.
//!
//! This module contains all HTTP handlers organized by domain.

pub mod health;
pub mod issuance;

// Re-export handlers for the router
pub use health::health_check;
pub use issuance::{issuance_callback, issuance_request, issuance_response};
