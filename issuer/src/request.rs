//! Issuance request body.
//!
//! The request is loaded once from a JSON template and specialised per
//! request: callback URL and state, issuer identifiers, user claims and an
//! optional PIN. Template keys this model does not know are preserved.

use crate::config::IssuanceConfig;
use crate::constants::CALLBACK_API_KEY_HEADER;
use crate::error::{IssuerError, Result};
use crate::state::{SessionId, UserClaims};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// Body of a `createIssuanceRequest` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuanceRequest {
    /// Issuer DID.
    #[serde(default)]
    pub authority: String,

    /// Ask the service to render the QR code.
    #[serde(
        rename = "includeQRCode",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub include_qr_code: Option<bool>,

    /// Wallet-facing issuer information.
    #[serde(default)]
    pub registration: Registration,

    /// Where and how the service reports request lifecycle events.
    #[serde(default)]
    pub callback: CallbackSettings,

    /// Credential type.
    #[serde(rename = "type", default)]
    pub credential_type: String,

    /// Credential manifest URL.
    #[serde(default)]
    pub manifest: String,

    /// PIN policy (absent when no PIN is required).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<PinSettings>,

    /// Claims written into the credential.
    #[serde(default)]
    pub claims: Map<String, Value>,

    /// Template keys without a dedicated field.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Wallet-facing issuer information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    /// Name displayed by the wallet.
    #[serde(default)]
    pub client_name: String,

    /// Issuer logo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,

    /// Terms of service link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_of_service_url: Option<String>,

    /// Registration keys without a dedicated field.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Callback settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackSettings {
    /// Callback endpoint of this service.
    #[serde(default)]
    pub url: String,

    /// Correlation token echoed back in every callback.
    #[serde(default)]
    pub state: String,

    /// Headers the service adds to callback requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,

    /// Callback keys without a dedicated field.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// PIN policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinSettings {
    /// PIN value (filled in per request).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Number of digits.
    pub length: u8,

    /// PIN keys without a dedicated field, such as `type`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IssuanceRequest {
    /// Parse a request template.
    ///
    /// A `pin` entry with length `0` is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`IssuerError::InvalidTemplate`] if the JSON does not match
    /// the request shape.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut template: Self =
            serde_json::from_str(json).map_err(|e| IssuerError::InvalidTemplate(e.to_string()))?;

        if template.pin.as_ref().is_some_and(|pin| pin.length == 0) {
            template.pin = None;
        }

        Ok(template)
    }

    /// Load a request template from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`IssuerError::InvalidTemplate`] if the file cannot be read
    /// or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| IssuerError::InvalidTemplate(format!("{}: {e}", path.display())))?;

        Self::from_json(&json)
    }

    /// Specialise the template for one issuance request.
    ///
    /// Overwrites the callback, issuer identifiers and the `email`/`name`
    /// claims. Other template claims pass through. The PIN value is left
    /// for the caller to fill in.
    #[must_use]
    pub fn prepare(
        &self,
        config: &IssuanceConfig,
        session_id: SessionId,
        user: &UserClaims,
    ) -> Self {
        let mut request = self.clone();

        request.callback.url = config.callback_url();
        request.callback.state = session_id.to_string();
        if let Some(api_key) = &config.callback_api_key {
            request
                .callback
                .headers
                .get_or_insert_with(BTreeMap::new)
                .insert(CALLBACK_API_KEY_HEADER.to_string(), api_key.clone());
        }

        request.authority.clone_from(&config.authority);
        if let Some(client_name) = &config.client_name {
            request.registration.client_name.clone_from(client_name);
        }
        if config.logo_url.is_some() {
            request.registration.logo_url.clone_from(&config.logo_url);
        }
        if config.terms_of_service_url.is_some() {
            request
                .registration
                .terms_of_service_url
                .clone_from(&config.terms_of_service_url);
        }
        request.credential_type.clone_from(&config.credential_type);
        request.manifest.clone_from(&config.manifest);

        request
            .claims
            .insert("email".to_string(), Value::String(user.email.clone()));
        request
            .claims
            .insert("name".to_string(), Value::String(user.name.clone()));

        request
    }

    /// Number of PIN digits required, if any.
    #[must_use]
    pub fn pin_length(&self) -> Option<u8> {
        self.pin.as_ref().map(|pin| pin.length)
    }

    /// Set the PIN value. No-op when the template has no PIN policy.
    pub fn set_pin_value(&mut self, value: impl Into<String>) {
        if let Some(pin) = self.pin.as_mut() {
            pin.value = Some(value.into());
        }
    }
}
