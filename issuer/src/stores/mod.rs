//! Storage implementations for the issuance flow.
//!
//! - **Session Store** (in-memory) - Process-local session map with TTL
//! - **Event Log** (in-memory) - Issuance events kept in memory
//!
//! Durable event storage lives in [`crate::providers::TableStorageEventLog`].

pub mod memory;

// Re-exports
pub use memory::{InMemoryEventLog, InMemorySessionStore};
