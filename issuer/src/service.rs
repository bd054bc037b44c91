//! Issuance service.
//!
//! The three operations of the issuance flow, sharing one session store:
//!
//! - [`IssuanceService::initiate_issuance`] marks the session pending and
//!   creates an issuance request at the external service
//! - [`IssuanceService::handle_callback`] applies lifecycle events posted by
//!   the external service
//! - [`IssuanceService::get_status`] reads the current status for polling
//!
//! Callbacks correlate through the session id handed to the external service
//! as callback state.

use crate::callback::CallbackPayload;
use crate::config::IssuanceConfig;
use crate::environment::IssuerEnvironment;
use crate::error::{IssuerError, Result};
use crate::pin;
use crate::providers::{
    AccessTokenProvider, IssuanceApi, IssuanceEvent, IssuanceEventLog, SessionStore,
};
use crate::request::IssuanceRequest;
use crate::state::{IssuanceStatus, Session, SessionData, SessionId, UserClaims};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde_json::{Map, Value};
use std::sync::Mutex;

/// Result of a successful initiation.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuanceInitiated {
    /// Issuance API response, augmented with `id` (the session id) and
    /// `pin` when one was generated.
    pub body: Map<String, Value>,

    /// PIN to show to the user out of band.
    pub pin: Option<String>,
}

/// What a callback did to the session store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The session status was replaced.
    Updated(IssuanceStatus),

    /// The status code does not update sessions.
    Ignored,

    /// The callback did not carry the configured API key.
    Unauthorized,

    /// No live session matches the callback state.
    UnknownSession,
}

impl CallbackOutcome {
    /// Metric label of the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Updated(_) => "updated",
            Self::Ignored => "ignored",
            Self::Unauthorized => "unauthorized",
            Self::UnknownSession => "unknown_session",
        }
    }
}

/// Result of a status poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLookup {
    /// Current status record.
    Found(SessionData),

    /// The session exists but no issuance was initiated yet.
    NotInitiated,

    /// No live session has this id.
    UnknownSession,
}

impl StatusLookup {
    /// Status record, if any.
    #[must_use]
    pub fn into_session_data(self) -> Option<SessionData> {
        match self {
            Self::Found(data) => Some(data),
            Self::NotInitiated | Self::UnknownSession => None,
        }
    }
}

/// Issuance service.
///
/// Generic over its providers so that tests run against
/// [`crate::mocks`] and production against the HTTP clients.
///
/// # Example
///
/// ```
/// use vc_issuer::mocks::{MockEventLog, MockIssuanceApi, MockTokenProvider};
/// use vc_issuer::stores::InMemorySessionStore;
/// use vc_issuer::{IssuanceConfig, IssuanceRequest, IssuanceService, IssuerEnvironment};
/// use rand::rngs::mock::StepRng;
///
/// # fn main() -> vc_issuer::Result<()> {
/// let env = IssuerEnvironment::new(
///     InMemorySessionStore::default(),
///     MockTokenProvider::new(),
///     MockIssuanceApi::new(),
///     MockEventLog::new(),
/// );
/// let config = IssuanceConfig::new("https://issuer.example.com", "did:web:issuer", "Employee", "https://manifest");
/// let template = IssuanceRequest::from_json(r#"{ "claims": {} }"#)?;
///
/// let service = IssuanceService::new(env, config, template).with_pin_rng(StepRng::new(0, 1));
/// # Ok(())
/// # }
/// ```
pub struct IssuanceService<S, T, A, L>
where
    S: SessionStore + Clone,
    T: AccessTokenProvider + Clone,
    A: IssuanceApi + Clone,
    L: IssuanceEventLog + Clone,
{
    env: IssuerEnvironment<S, T, A, L>,
    config: IssuanceConfig,
    template: IssuanceRequest,
    pin_rng: Mutex<Box<dyn RngCore + Send>>,
}

impl<S, T, A, L> IssuanceService<S, T, A, L>
where
    S: SessionStore + Clone,
    T: AccessTokenProvider + Clone,
    A: IssuanceApi + Clone,
    L: IssuanceEventLog + Clone,
{
    /// Create a service drawing PINs from an entropy-seeded generator.
    #[must_use]
    pub fn new(
        env: IssuerEnvironment<S, T, A, L>,
        config: IssuanceConfig,
        template: IssuanceRequest,
    ) -> Self {
        Self {
            env,
            config,
            template,
            pin_rng: Mutex::new(Box::new(StdRng::from_entropy())),
        }
    }

    /// Draw PINs from `rng` instead.
    #[must_use]
    pub fn with_pin_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.pin_rng = Mutex::new(Box::new(rng));
        self
    }

    /// Issuance configuration.
    #[must_use]
    pub const fn config(&self) -> &IssuanceConfig {
        &self.config
    }

    /// Injected providers.
    #[must_use]
    pub const fn environment(&self) -> &IssuerEnvironment<S, T, A, L> {
        &self.env
    }

    /// Resume the session `existing`, or start a new one.
    ///
    /// # Returns
    ///
    /// The live session id, and `true` if a new session was created.
    ///
    /// # Errors
    ///
    /// Returns error if the session store fails.
    pub async fn resume_or_start_session(
        &self,
        existing: Option<SessionId>,
    ) -> Result<(SessionId, bool)> {
        if let Some(session_id) = existing {
            if self.env.sessions.get(session_id).await?.is_some() {
                return Ok((session_id, false));
            }
        }

        let session = Session::new(SessionId::new());
        self.env.sessions.set(&session).await?;
        tracing::debug!(session_id = %session.session_id, "Started session");

        Ok((session.session_id, true))
    }

    /// Create an issuance request for `user`.
    ///
    /// Marks the session pending (creating it if needed), acquires an access
    /// token, specialises the request template, and submits it. The API's
    /// response is returned with `id` set to the session id, plus `pin` when
    /// the template requires one.
    ///
    /// # Errors
    ///
    /// - [`IssuerError::TokenAcquisitionFailed`] if no access token could be
    ///   acquired; the issuance API is not called
    /// - [`IssuerError::IssuanceApiUnavailable`] / [`IssuerError::IssuanceApiRejected`]
    ///   if the issuance API call fails
    /// - [`IssuerError::SessionStoreError`] if the session store fails
    pub async fn initiate_issuance(
        &self,
        session_id: SessionId,
        user: &UserClaims,
    ) -> Result<IssuanceInitiated> {
        let result = self.try_initiate_issuance(session_id, user).await;

        let outcome = match &result {
            Ok(_) => "created",
            Err(IssuerError::TokenAcquisitionFailed(_)) => "unauthorized",
            Err(e) if e.is_upstream_error() => "upstream_error",
            Err(_) => "error",
        };
        metrics::counter!("vc_issuer_issuance_requests_total", "outcome" => outcome).increment(1);

        result
    }

    async fn try_initiate_issuance(
        &self,
        session_id: SessionId,
        user: &UserClaims,
    ) -> Result<IssuanceInitiated> {
        let mut session = match self.env.sessions.get(session_id).await? {
            Some(session) => session,
            None => {
                tracing::debug!(%session_id, "No session for issuance, creating one");
                Session::new(session_id)
            }
        };
        session.user = Some(user.clone());
        session.session_data = Some(SessionData::pending());
        self.env.sessions.set(&session).await?;

        let token = self.env.tokens.acquire_token().await.map_err(|e| {
            tracing::warn!(%session_id, error = %e, "Could not acquire access token");
            match e {
                IssuerError::TokenAcquisitionFailed(_) => e,
                other => IssuerError::TokenAcquisitionFailed(other.to_string()),
            }
        })?;

        let mut request = self.template.prepare(&self.config, session_id, user);
        let pin = request
            .pin_length()
            .map(|length| self.generate_pin(length))
            .transpose()?;
        if let Some(pin) = &pin {
            request.set_pin_value(pin.clone());
        }

        let mut body = self
            .env
            .issuance_api
            .create_issuance_request(&token.token, &request)
            .await
            .inspect_err(|e| {
                tracing::error!(%session_id, error = %e, "Issuance request failed");
            })?;

        body.insert("id".to_string(), Value::String(session_id.to_string()));
        if let Some(pin) = &pin {
            body.insert("pin".to_string(), Value::String(pin.clone()));
        }

        tracing::info!(
            %session_id,
            pin_required = pin.is_some(),
            "Issuance request created"
        );

        Ok(IssuanceInitiated { body, pin })
    }

    fn generate_pin(&self, length: u8) -> Result<String> {
        let mut rng = self
            .pin_rng
            .lock()
            .map_err(|_| IssuerError::InternalError("PIN generator lock poisoned".to_string()))?;

        pin::generate_pin(length, &mut **rng)
    }

    /// Apply a callback from the issuance service.
    ///
    /// Codes other than `request_retrieved`, `issuance_successful` and
    /// `issuance_error` are ignored, as are callbacks whose state matches no
    /// live session. On `issuance_successful`, an issuance event is recorded
    /// when enabled; failures to record are logged and swallowed.
    ///
    /// # Errors
    ///
    /// Returns error only if the session store fails. Callers acknowledge
    /// the callback regardless.
    pub async fn handle_callback(
        &self,
        payload: &CallbackPayload,
        api_key: Option<&str>,
    ) -> Result<CallbackOutcome> {
        let result = self.try_handle_callback(payload, api_key).await;

        let request_status = payload.status().map_or("unknown", IssuanceStatus::as_str);
        let outcome = result.as_ref().map_or("error", |outcome| outcome.as_str());
        metrics::counter!(
            "vc_issuer_callbacks_total",
            "request_status" => request_status,
            "outcome" => outcome
        )
        .increment(1);

        result
    }

    async fn try_handle_callback(
        &self,
        payload: &CallbackPayload,
        api_key: Option<&str>,
    ) -> Result<CallbackOutcome> {
        if self
            .config
            .callback_api_key
            .as_deref()
            .is_some_and(|expected| api_key != Some(expected))
        {
            tracing::warn!(state = %payload.state, "Callback API key mismatch, ignoring callback");
            return Ok(CallbackOutcome::Unauthorized);
        }

        let Some(session_data) = payload.session_data() else {
            tracing::debug!(
                request_status = payload.lifecycle_code().unwrap_or_default(),
                "Callback status does not update sessions"
            );
            return Ok(CallbackOutcome::Ignored);
        };

        let session = match payload.session_id() {
            Some(session_id) => self.env.sessions.get(session_id).await?,
            None => None,
        };
        let Some(mut session) = session else {
            tracing::warn!(state = %payload.state, "Callback for unknown session");
            return Ok(CallbackOutcome::UnknownSession);
        };

        let session_id = session.session_id;
        let status = session_data.status;
        session.session_data = Some(session_data);
        self.env.sessions.set(&session).await?;

        tracing::info!(
            %session_id,
            request_status = %status,
            request_id = payload.request_id.as_deref().unwrap_or_default(),
            "Session status updated"
        );

        if status == IssuanceStatus::IssuanceSuccessful && self.config.record_issuance_events {
            self.record_issuance(session_id, session.user.as_ref()).await;
        }

        Ok(CallbackOutcome::Updated(status))
    }

    async fn record_issuance(&self, session_id: SessionId, user: Option<&UserClaims>) {
        let Some(user) = user else {
            tracing::warn!(%session_id, "No user stored for session, issuance event skipped");
            metrics::counter!("vc_issuer_issuance_events_total", "outcome" => "skipped")
                .increment(1);
            return;
        };

        let event = IssuanceEvent::new(self.config.credential_type.clone(), user);
        match self.env.event_log.record(&event).await {
            Ok(()) => {
                tracing::info!(%session_id, event_id = %event.event_id, "Issuance event recorded");
                metrics::counter!("vc_issuer_issuance_events_total", "outcome" => "recorded")
                    .increment(1);
            }
            Err(e) => {
                tracing::error!(%session_id, error = %e, "Failed to record issuance event");
                metrics::counter!("vc_issuer_issuance_events_total", "outcome" => "failed")
                    .increment(1);
            }
        }
    }

    /// Current status of the issuance for `session_id`.
    ///
    /// Read-only.
    ///
    /// # Errors
    ///
    /// Returns error if the session store fails.
    pub async fn get_status(&self, session_id: SessionId) -> Result<StatusLookup> {
        let lookup = match self.env.sessions.get(session_id).await? {
            None => StatusLookup::UnknownSession,
            Some(Session {
                session_data: Some(data),
                ..
            }) => StatusLookup::Found(data),
            Some(_) => StatusLookup::NotInitiated,
        };

        Ok(lookup)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::{MockEventLog, MockIssuanceApi, MockTokenProvider};
    use crate::stores::InMemorySessionStore;
    use rand::rngs::mock::StepRng;

    type TestService =
        IssuanceService<InMemorySessionStore, MockTokenProvider, MockIssuanceApi, MockEventLog>;

    const TEMPLATE: &str = r#"{
        "includeQRCode": false,
        "registration": { "clientName": "Test Issuer" },
        "pin": { "value": "", "length": 4 },
        "claims": {}
    }"#;

    fn config() -> IssuanceConfig {
        IssuanceConfig::new(
            "https://issuer.example.com",
            "did:web:issuer.example.com",
            "VerifiedEmployee",
            "https://manifest.example.com/employee",
        )
    }

    fn service_with(
        tokens: MockTokenProvider,
        api: MockIssuanceApi,
        config: IssuanceConfig,
    ) -> TestService {
        let env = IssuerEnvironment::new(
            InMemorySessionStore::default(),
            tokens,
            api,
            MockEventLog::new(),
        );
        IssuanceService::new(env, config, IssuanceRequest::from_json(TEMPLATE).unwrap())
            .with_pin_rng(StepRng::new(0, 0))
    }

    fn alice() -> UserClaims {
        UserClaims::new("alice@example.com", "Alice")
    }

    fn callback(code: &str, session_id: SessionId) -> CallbackPayload {
        CallbackPayload {
            request_id: Some("req-1".to_string()),
            request_status: Some(code.to_string()),
            code: None,
            state: session_id.to_string(),
            error: None,
        }
    }

    #[tokio::test]
    async fn test_initiate_marks_session_pending_and_returns_id_and_pin() {
        let service = service_with(MockTokenProvider::new(), MockIssuanceApi::new(), config());
        let (session_id, _) = service.resume_or_start_session(None).await.unwrap();

        let initiated = service.initiate_issuance(session_id, &alice()).await.unwrap();

        assert_eq!(initiated.pin.as_deref(), Some("1000"));
        assert_eq!(initiated.body["id"], session_id.to_string());
        assert_eq!(initiated.body["pin"], "1000");
        assert_eq!(initiated.body["requestId"], "mock-request-id");

        let status = service.get_status(session_id).await.unwrap();
        assert_eq!(status, StatusLookup::Found(SessionData::pending()));
    }

    #[tokio::test]
    async fn test_initiate_sends_prepared_request() {
        let api = MockIssuanceApi::new();
        let service = service_with(MockTokenProvider::new(), api.clone(), config());
        let session_id = SessionId::new();

        service.initiate_issuance(session_id, &alice()).await.unwrap();

        let requests = api.requests().unwrap();
        assert_eq!(requests.len(), 1);
        let sent = &requests[0];
        assert_eq!(sent.access_token, "mock-access-token");
        assert_eq!(sent.request.callback.state, session_id.to_string());
        assert_eq!(sent.request.claims["email"], "alice@example.com");
        assert_eq!(sent.request.pin.as_ref().unwrap().value.as_deref(), Some("1000"));
    }

    #[tokio::test]
    async fn test_initiate_creates_missing_session() {
        let service = service_with(MockTokenProvider::new(), MockIssuanceApi::new(), config());
        let session_id = SessionId::new();

        service.initiate_issuance(session_id, &alice()).await.unwrap();

        let session = service
            .environment()
            .sessions
            .get(session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.user, Some(alice()));
    }

    #[tokio::test]
    async fn test_token_failure_aborts_before_api_call() {
        let api = MockIssuanceApi::new();
        let tokens = MockTokenProvider::failing();
        let service = service_with(tokens.clone(), api.clone(), config());
        let session_id = SessionId::new();

        let result = service.initiate_issuance(session_id, &alice()).await;

        assert!(matches!(result, Err(IssuerError::TokenAcquisitionFailed(_))));
        assert_eq!(tokens.call_count(), 1);
        assert!(api.requests().unwrap().is_empty());
        // Pending was written before the token step.
        assert_eq!(
            service.get_status(session_id).await.unwrap(),
            StatusLookup::Found(SessionData::pending())
        );
    }

    #[tokio::test]
    async fn test_api_response_passed_through_with_id_and_pin() {
        let mut response = Map::new();
        response.insert("requestId".to_string(), Value::String("req-42".to_string()));
        response.insert("url".to_string(), Value::String("openid-vc://?request_uri=x".to_string()));
        let tokens = MockTokenProvider::new();
        let service = service_with(
            tokens.clone(),
            MockIssuanceApi::new().with_response(response),
            config(),
        );
        let session_id = SessionId::new();

        let initiated = service.initiate_issuance(session_id, &alice()).await.unwrap();

        assert_eq!(tokens.call_count(), 1);
        assert_eq!(initiated.body.len(), 4);
        assert_eq!(initiated.body["requestId"], "req-42");
        assert_eq!(initiated.body["url"], "openid-vc://?request_uri=x");
        assert_eq!(initiated.body["id"], session_id.to_string());
        assert_eq!(initiated.body["pin"], "1000");
    }

    #[tokio::test]
    async fn test_api_rejection_surfaces_distinctly() {
        let api = MockIssuanceApi::new().with_error(IssuerError::IssuanceApiRejected {
            status: 400,
            code: "badOrMissingField".to_string(),
            message: "manifest is invalid".to_string(),
        });
        let service = service_with(MockTokenProvider::new(), api, config());

        let result = service.initiate_issuance(SessionId::new(), &alice()).await;

        assert!(matches!(
            result,
            Err(IssuerError::IssuanceApiRejected { status: 400, .. })
        ));
    }

    #[tokio::test]
    async fn test_template_without_pin_returns_no_pin() {
        let env = IssuerEnvironment::new(
            InMemorySessionStore::default(),
            MockTokenProvider::new(),
            MockIssuanceApi::new(),
            MockEventLog::new(),
        );
        let template = IssuanceRequest::from_json(r#"{ "claims": {} }"#).unwrap();
        let service = IssuanceService::new(env, config(), template);

        let initiated = service.initiate_issuance(SessionId::new(), &alice()).await.unwrap();

        assert!(initiated.pin.is_none());
        assert!(!initiated.body.contains_key("pin"));
    }

    #[tokio::test]
    async fn test_callback_updates_known_session() {
        let service = service_with(MockTokenProvider::new(), MockIssuanceApi::new(), config());
        let session_id = SessionId::new();
        service.initiate_issuance(session_id, &alice()).await.unwrap();

        let outcome = service
            .handle_callback(&callback("request_retrieved", session_id), None)
            .await
            .unwrap();

        assert_eq!(outcome, CallbackOutcome::Updated(IssuanceStatus::RequestRetrieved));
        assert_eq!(
            service.get_status(session_id).await.unwrap(),
            StatusLookup::Found(SessionData::request_retrieved())
        );
    }

    #[tokio::test]
    async fn test_callback_for_unknown_session_is_noop() {
        let service = service_with(MockTokenProvider::new(), MockIssuanceApi::new(), config());
        let session_id = SessionId::new();

        let outcome = service
            .handle_callback(&callback("request_retrieved", session_id), None)
            .await
            .unwrap();

        assert_eq!(outcome, CallbackOutcome::UnknownSession);
        assert_eq!(
            service.get_status(session_id).await.unwrap(),
            StatusLookup::UnknownSession
        );
    }

    #[tokio::test]
    async fn test_callback_with_unmapped_status_is_ignored() {
        let service = service_with(MockTokenProvider::new(), MockIssuanceApi::new(), config());
        let session_id = SessionId::new();
        service.initiate_issuance(session_id, &alice()).await.unwrap();

        let outcome = service
            .handle_callback(&callback("presentation_verified", session_id), None)
            .await
            .unwrap();

        assert_eq!(outcome, CallbackOutcome::Ignored);
        assert_eq!(
            service.get_status(session_id).await.unwrap(),
            StatusLookup::Found(SessionData::pending())
        );
    }

    #[tokio::test]
    async fn test_callback_api_key_enforced() {
        let service = service_with(
            MockTokenProvider::new(),
            MockIssuanceApi::new(),
            config().with_callback_api_key("s3cret"),
        );
        let session_id = SessionId::new();
        service.initiate_issuance(session_id, &alice()).await.unwrap();
        let payload = callback("request_retrieved", session_id);

        assert_eq!(
            service.handle_callback(&payload, None).await.unwrap(),
            CallbackOutcome::Unauthorized
        );
        assert_eq!(
            service.handle_callback(&payload, Some("wrong")).await.unwrap(),
            CallbackOutcome::Unauthorized
        );
        assert_eq!(
            service.get_status(session_id).await.unwrap(),
            StatusLookup::Found(SessionData::pending())
        );

        assert_eq!(
            service.handle_callback(&payload, Some("s3cret")).await.unwrap(),
            CallbackOutcome::Updated(IssuanceStatus::RequestRetrieved)
        );
    }

    #[tokio::test]
    async fn test_event_log_failure_does_not_fail_callback() {
        let env = IssuerEnvironment::new(
            InMemorySessionStore::default(),
            MockTokenProvider::new(),
            MockIssuanceApi::new(),
            MockEventLog::failing(),
        );
        let service = IssuanceService::new(
            env,
            config().with_record_issuance_events(true),
            IssuanceRequest::from_json(TEMPLATE).unwrap(),
        );
        let session_id = SessionId::new();
        service.initiate_issuance(session_id, &alice()).await.unwrap();

        let outcome = service
            .handle_callback(&callback("issuance_successful", session_id), None)
            .await
            .unwrap();

        assert_eq!(outcome, CallbackOutcome::Updated(IssuanceStatus::IssuanceSuccessful));
    }

    #[tokio::test]
    async fn test_no_event_without_stored_user() {
        let service = service_with(
            MockTokenProvider::new(),
            MockIssuanceApi::new(),
            config().with_record_issuance_events(true),
        );
        let (session_id, _) = service.resume_or_start_session(None).await.unwrap();

        service
            .handle_callback(&callback("issuance_successful", session_id), None)
            .await
            .unwrap();

        assert!(service.environment().event_log.events().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_of_session_without_issuance() {
        let service = service_with(MockTokenProvider::new(), MockIssuanceApi::new(), config());
        let (session_id, created) = service.resume_or_start_session(None).await.unwrap();

        assert!(created);
        assert_eq!(
            service.get_status(session_id).await.unwrap(),
            StatusLookup::NotInitiated
        );
    }

    #[tokio::test]
    async fn test_resume_or_start_session() {
        let service = service_with(MockTokenProvider::new(), MockIssuanceApi::new(), config());

        let (first, created) = service.resume_or_start_session(None).await.unwrap();
        assert!(created);

        let (resumed, created) = service.resume_or_start_session(Some(first)).await.unwrap();
        assert!(!created);
        assert_eq!(resumed, first);

        let (fresh, created) = service
            .resume_or_start_session(Some(SessionId::new()))
            .await
            .unwrap();
        assert!(created);
        assert_ne!(fresh, first);
    }
}
