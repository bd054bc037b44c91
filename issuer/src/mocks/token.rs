//! Mock access token provider for testing.

use crate::error::{IssuerError, Result};
use crate::providers::{AccessToken, AccessTokenProvider};
use chrono::{Duration, Utc};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Token handed out by a succeeding [`MockTokenProvider`].
pub const MOCK_ACCESS_TOKEN: &str = "mock-access-token";

/// Mock token provider.
///
/// Hands out a fixed token, or fails with
/// [`IssuerError::TokenAcquisitionFailed`].
#[derive(Debug, Clone)]
pub struct MockTokenProvider {
    /// Whether to simulate success or failure.
    pub should_succeed: bool,

    calls: Arc<AtomicUsize>,
}

impl MockTokenProvider {
    /// Create a mock token provider that succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            should_succeed: true,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a mock token provider that always fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            should_succeed: false,
            ..Self::new()
        }
    }

    /// Number of `acquire_token` calls so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockTokenProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessTokenProvider for MockTokenProvider {
    fn acquire_token(&self) -> impl Future<Output = Result<AccessToken>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let should_succeed = self.should_succeed;

        async move {
            if should_succeed {
                Ok(AccessToken::new(MOCK_ACCESS_TOKEN, Utc::now() + Duration::hours(1)))
            } else {
                Err(IssuerError::TokenAcquisitionFailed(
                    "mock token provider configured to fail".to_string(),
                ))
            }
        }
    }
}
