//! Issuance environment.
//!
//! Bundles the external collaborators of the issuance flow for dependency
//! injection into [`crate::IssuanceService`].

use crate::providers::{AccessTokenProvider, IssuanceApi, IssuanceEventLog, SessionStore};

/// Issuance environment.
///
/// # Type Parameters
///
/// - `S`: Session store
/// - `T`: Access token provider
/// - `A`: Issuance API
/// - `L`: Issuance event log
#[derive(Debug, Clone)]
pub struct IssuerEnvironment<S, T, A, L>
where
    S: SessionStore + Clone,
    T: AccessTokenProvider + Clone,
    A: IssuanceApi + Clone,
    L: IssuanceEventLog + Clone,
{
    /// Session store shared by every endpoint.
    pub sessions: S,

    /// Token provider (client-credential grant).
    pub tokens: T,

    /// Issuance API client.
    pub issuance_api: A,

    /// Audit event log.
    pub event_log: L,
}

impl<S, T, A, L> IssuerEnvironment<S, T, A, L>
where
    S: SessionStore + Clone,
    T: AccessTokenProvider + Clone,
    A: IssuanceApi + Clone,
    L: IssuanceEventLog + Clone,
{
    /// Create a new issuance environment.
    #[must_use]
    pub const fn new(sessions: S, tokens: T, issuance_api: A, event_log: L) -> Self {
        Self {
            sessions,
            tokens,
            issuance_api,
            event_log,
        }
    }
}
