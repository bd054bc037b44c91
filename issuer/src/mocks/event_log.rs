//! Mock issuance event log for testing.

use crate::error::{IssuerError, Result};
use crate::providers::{IssuanceEvent, IssuanceEventLog};
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Mock event log.
///
/// Records events, or rejects them when configured to fail.
#[derive(Debug, Clone)]
pub struct MockEventLog {
    /// Whether to simulate success or failure.
    pub should_succeed: bool,

    events: Arc<Mutex<Vec<IssuanceEvent>>>,
}

impl MockEventLog {
    /// Create a mock event log that accepts every event.
    #[must_use]
    pub fn new() -> Self {
        Self {
            should_succeed: true,
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock event log that rejects every event.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            should_succeed: false,
            ..Self::new()
        }
    }

    /// Events accepted so far.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn events(&self) -> Result<Vec<IssuanceEvent>> {
        Ok(self
            .events
            .lock()
            .map_err(|_| IssuerError::InternalError("Mutex lock failed".to_string()))?
            .clone())
    }
}

impl Default for MockEventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl IssuanceEventLog for MockEventLog {
    fn record(&self, event: &IssuanceEvent) -> impl Future<Output = Result<()>> + Send {
        let events = Arc::clone(&self.events);
        let event = event.clone();
        let should_succeed = self.should_succeed;

        async move {
            if !should_succeed {
                return Err(IssuerError::EventLogFailed(
                    "mock event log configured to fail".to_string(),
                ));
            }

            events
                .lock()
                .map_err(|_| IssuerError::InternalError("Mutex lock failed".to_string()))?
                .push(event);
            Ok(())
        }
    }
}
