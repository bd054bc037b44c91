//! In-memory stores.
//!
//! State lives as long as the process. Sessions carry an expiry that slides
//! forward on every write. Expired entries are dropped lazily on read, swept
//! whenever a new session is inserted, or removed in bulk through
//! [`InMemorySessionStore::purge_expired`].
//!
//! # Example
//!
//! ```
//! use chrono::Duration;
//! use vc_issuer::stores::InMemorySessionStore;
//!
//! let store = InMemorySessionStore::new(Duration::hours(1));
//! assert_eq!(store.ttl(), Duration::hours(1));
//! ```

use crate::error::{IssuerError, Result};
use crate::providers::{IssuanceEvent, IssuanceEventLog, SessionStore};
use crate::state::{Session, SessionId};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Default session lifetime (24 hours).
pub const DEFAULT_SESSION_TTL_SECS: i64 = 86_400;

#[derive(Debug, Clone)]
struct Entry {
    session: Session,
    expires_at: DateTime<Utc>,
}

/// Process-wide session store.
///
/// Cloning shares the underlying map.
#[derive(Debug, Clone)]
pub struct InMemorySessionStore {
    entries: Arc<Mutex<HashMap<SessionId, Entry>>>,
    ttl: Duration,
}

impl InMemorySessionStore {
    /// Create a store whose sessions live for `ttl` after their last write.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Session lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Remove every expired session.
    ///
    /// # Returns
    ///
    /// Number of sessions removed.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn purge_expired(&self) -> Result<usize> {
        let mut entries = self.lock()?;
        Ok(purge(&mut entries, Utc::now()))
    }

    /// Number of stored sessions, expired ones included.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    /// Returns `true` if no session is stored.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<SessionId, Entry>>> {
        self.entries
            .lock()
            .map_err(|_| IssuerError::SessionStoreError("Mutex lock failed".to_string()))
    }
}

fn purge(entries: &mut HashMap<SessionId, Entry>, now: DateTime<Utc>) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| entry.expires_at > now);
    let purged = before - entries.len();

    if purged > 0 {
        tracing::debug!(purged, "Purged expired sessions");
    }

    purged
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_SESSION_TTL_SECS))
    }
}

impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: SessionId) -> Result<Option<Session>> {
        let mut entries = self.lock()?;

        match entries.get(&session_id) {
            Some(entry) if entry.expires_at > Utc::now() => Ok(Some(entry.session.clone())),
            Some(_) => {
                entries.remove(&session_id);
                tracing::debug!(%session_id, "Session expired");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, session: &Session) -> Result<()> {
        let now = Utc::now();
        let entry = Entry {
            session: session.clone(),
            expires_at: now + self.ttl,
        };

        let mut entries = self.lock()?;
        if !entries.contains_key(&session.session_id) {
            purge(&mut entries, now);
        }
        entries.insert(session.session_id, entry);
        Ok(())
    }
}

/// Event log keeping issuance events in memory.
///
/// Used when durable recording is disabled, and in tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventLog {
    events: Arc<Mutex<Vec<IssuanceEvent>>>,
}

impl InMemoryEventLog {
    /// Create an empty event log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events, oldest first.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn events(&self) -> Result<Vec<IssuanceEvent>> {
        Ok(self
            .events
            .lock()
            .map_err(|_| IssuerError::EventLogFailed("Mutex lock failed".to_string()))?
            .clone())
    }
}

impl IssuanceEventLog for InMemoryEventLog {
    async fn record(&self, event: &IssuanceEvent) -> Result<()> {
        self.events
            .lock()
            .map_err(|_| IssuerError::EventLogFailed("Mutex lock failed".to_string()))?
            .push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::state::{SessionData, UserClaims};

    #[tokio::test]
    async fn test_get_unknown_session_is_none() {
        let store = InMemorySessionStore::default();
        assert!(store.get(SessionId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_replaces_session_wholesale() {
        let store = InMemorySessionStore::default();
        let id = SessionId::new();

        let mut session = Session::new(id);
        session.session_data = Some(SessionData::pending());
        store.set(&session).await.unwrap();

        session.session_data = Some(SessionData::request_retrieved());
        store.set(&session).await.unwrap();

        let stored = store.get(id).await.unwrap().unwrap();
        assert_eq!(stored.session_data, Some(SessionData::request_retrieved()));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = InMemorySessionStore::default();
        let other = store.clone();
        let id = SessionId::new();

        store.set(&Session::new(id)).await.unwrap();

        assert!(other.get(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_expired_session_is_absent_and_removed() {
        let store = InMemorySessionStore::new(Duration::zero());
        let id = SessionId::new();
        store.set(&Session::new(id)).await.unwrap();

        assert!(store.get(id).await.unwrap().is_none());
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_new_session_sweeps_expired_entries() {
        let store = InMemorySessionStore::new(Duration::seconds(-1));
        let first = SessionId::new();
        store.set(&Session::new(first)).await.unwrap();

        // Rewriting an existing session does not sweep.
        store.set(&Session::new(first)).await.unwrap();
        assert_eq!(store.len().unwrap(), 1);

        let second = SessionId::new();
        store.set(&Session::new(second)).await.unwrap();
        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(store.purge_expired().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let expired = InMemorySessionStore::new(Duration::seconds(-1));
        expired.set(&Session::new(SessionId::new())).await.unwrap();
        assert_eq!(expired.purge_expired().unwrap(), 1);
        assert!(expired.is_empty().unwrap());

        let live = InMemorySessionStore::default();
        live.set(&Session::new(SessionId::new())).await.unwrap();
        assert_eq!(live.purge_expired().unwrap(), 0);
        assert_eq!(live.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_event_log_records_in_order() {
        let log = InMemoryEventLog::new();
        let alice = UserClaims::new("alice@example.com", "Alice");
        let bob = UserClaims::new("bob@example.com", "Bob");

        log.record(&IssuanceEvent::new("VerifiedEmployee", &alice)).await.unwrap();
        log.record(&IssuanceEvent::new("VerifiedEmployee", &bob)).await.unwrap();

        let events = log.events().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].email, "alice@example.com");
        assert_eq!(events[1].email, "bob@example.com");
    }
}
