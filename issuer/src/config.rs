//! Issuance configuration.
//!
//! Holds the non-per-request values merged into every issuance request.
//! Values are provided by the application, not hardcoded.

use crate::constants::CALLBACK_PATH;

/// Issuance request configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuanceConfig {
    /// Public base URL of this service (e.g., "https://issuer.example.com").
    ///
    /// The callback URL will be: `{base_url}/api/issuer/issuance-request-callback`
    pub base_url: String,

    /// Decentralized identifier of the issuing authority.
    pub authority: String,

    /// Credential type recorded in requests and issuance events.
    pub credential_type: String,

    /// Credential manifest URL.
    pub manifest: String,

    /// Client name shown in the wallet (overrides the template when set).
    pub client_name: Option<String>,

    /// Logo shown in the wallet (overrides the template when set).
    pub logo_url: Option<String>,

    /// Terms of service link (overrides the template when set).
    pub terms_of_service_url: Option<String>,

    /// Shared secret the issuance service echoes in callback headers.
    pub callback_api_key: Option<String>,

    /// Append an event to the issuance log on successful issuance.
    ///
    /// Default: false
    pub record_issuance_events: bool,
}

impl IssuanceConfig {
    /// Create new issuance configuration.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Public base URL of this service
    /// * `authority` - Issuer DID
    /// * `credential_type` - Credential type
    /// * `manifest` - Credential manifest URL
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        authority: impl Into<String>,
        credential_type: impl Into<String>,
        manifest: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            authority: authority.into(),
            credential_type: credential_type.into(),
            manifest: manifest.into(),
            client_name: None,
            logo_url: None,
            terms_of_service_url: None,
            callback_api_key: None,
            record_issuance_events: false,
        }
    }

    /// Set the client name shown in the wallet.
    #[must_use]
    pub fn with_client_name(mut self, client_name: impl Into<String>) -> Self {
        self.client_name = Some(client_name.into());
        self
    }

    /// Set the logo URL shown in the wallet.
    #[must_use]
    pub fn with_logo_url(mut self, logo_url: impl Into<String>) -> Self {
        self.logo_url = Some(logo_url.into());
        self
    }

    /// Set the terms of service URL.
    #[must_use]
    pub fn with_terms_of_service_url(mut self, url: impl Into<String>) -> Self {
        self.terms_of_service_url = Some(url.into());
        self
    }

    /// Require callbacks to carry this API key.
    #[must_use]
    pub fn with_callback_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.callback_api_key = Some(api_key.into());
        self
    }

    /// Enable or disable issuance event recording.
    #[must_use]
    pub const fn with_record_issuance_events(mut self, enabled: bool) -> Self {
        self.record_issuance_events = enabled;
        self
    }

    /// Callback URL handed to the issuance service.
    #[must_use]
    pub fn callback_url(&self) -> String {
        format!("{}{CALLBACK_PATH}", self.base_url.trim_end_matches('/'))
    }
}
