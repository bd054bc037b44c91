//! Mock provider implementations for testing.
//!
//! This module provides simple, in-memory implementations of the external
//! provider traits for use in unit and integration tests. Sessions use the
//! real [`crate::stores::InMemorySessionStore`].

pub mod event_log;
pub mod issuance_api;
pub mod token;

pub use event_log::MockEventLog;
pub use issuance_api::MockIssuanceApi;
pub use token::{MOCK_ACCESS_TOKEN, MockTokenProvider};
