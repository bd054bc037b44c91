//! Session store trait.

use crate::error::Result;
use crate::state::{Session, SessionId};

/// Session store.
///
/// Shared by the initiator, the callback receiver and the status poller.
///
/// # Implementation Notes
///
/// - Unknown or expired ids are reported as `None`, never as an error
/// - `set` replaces the stored session wholesale (last writer wins)
/// - No optimistic concurrency control
pub trait SessionStore: Send + Sync {
    /// Get a session.
    ///
    /// # Returns
    ///
    /// The session if found and not expired.
    ///
    /// # Errors
    ///
    /// Returns error if the backing store is unavailable.
    fn get(
        &self,
        session_id: SessionId,
    ) -> impl std::future::Future<Output = Result<Option<Session>>> + Send;

    /// Store a session under `session.session_id`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns error if the backing store is unavailable.
    fn set(&self, session: &Session) -> impl std::future::Future<Output = Result<()>> + Send;
}
