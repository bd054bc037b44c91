//! Issuance event log trait.

use crate::error::Result;
use crate::state::UserClaims;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audit record of a successful issuance.
///
/// The issuance service does not return a durable credential id, so the
/// event id is generated locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuanceEvent {
    /// Locally generated unique id.
    pub event_id: Uuid,

    /// Issued credential type.
    pub credential_type: String,

    /// Email of the credential holder.
    pub email: String,

    /// Display name of the credential holder.
    pub name: String,

    /// When the issuance callback was received.
    pub issued_at: DateTime<Utc>,
}

impl IssuanceEvent {
    /// Create an event for `user` with a fresh id.
    #[must_use]
    pub fn new(credential_type: impl Into<String>, user: &UserClaims) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            credential_type: credential_type.into(),
            email: user.email.clone(),
            name: user.name.clone(),
            issued_at: Utc::now(),
        }
    }
}

/// Append-only issuance event log.
pub trait IssuanceEventLog: Send + Sync {
    /// Append an event.
    ///
    /// # Errors
    ///
    /// Returns [`crate::IssuerError::EventLogFailed`] if the event could not
    /// be written. Callers treat this as best-effort.
    fn record(
        &self,
        event: &IssuanceEvent,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
