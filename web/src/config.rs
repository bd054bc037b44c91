//! Configuration management for the issuer server.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Call `dotenvy::dotenv()` first to pick up a local `.env` file.

use chrono::Duration;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use vc_issuer::IssuanceConfig;
use vc_issuer::constants::{
    DEFAULT_AUTHORITY_HOST, DEFAULT_ISSUANCE_ENDPOINT, DEFAULT_VERIFIED_ID_SCOPE,
};
use vc_issuer::stores::memory::DEFAULT_SESSION_TTL_SECS;

/// Configuration loading errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be used.
    #[error("Invalid value for {key}: {message}")]
    Invalid {
        /// Variable name.
        key: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Azure Table holding issuance events.
#[derive(Clone, PartialEq, Eq)]
pub struct EventTableConfig {
    /// Storage account name.
    pub account: String,
    /// Table name.
    pub table: String,
    /// SAS token granting insert access.
    pub sas_token: String,
}

impl fmt::Debug for EventTableConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventTableConfig")
            .field("account", &self.account)
            .field("table", &self.table)
            .field("sas_token", &"<redacted>")
            .finish()
    }
}

/// Server configuration loaded from environment variables.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// Host to bind to (`HOST`, default `0.0.0.0`)
    pub host: String,
    /// Port to bind to (`PORT`, default `3000`)
    pub port: u16,
    /// Public base URL of this service (`BASE_URL`)
    pub base_url: String,
    /// Secret signing the session cookie (`COOKIE_SECRET`)
    pub cookie_secret: String,
    /// Session lifetime in seconds (`SESSION_TTL_SECS`, default 24 hours)
    pub session_ttl_secs: i64,

    /// Directory tenant of the issuing application (`VC_TENANT_ID`)
    pub tenant_id: String,
    /// Client ID of the issuing application (`VC_CLIENT_ID`)
    pub client_id: String,
    /// Client secret of the issuing application (`VC_CLIENT_SECRET`)
    pub client_secret: String,
    /// Token scope (`VC_SCOPE`)
    pub scope: String,
    /// Token authority host (`VC_AUTHORITY_HOST`)
    pub authority_host: String,
    /// Issuance API endpoint (`ISSUANCE_API_ENDPOINT`)
    pub issuance_endpoint: String,

    /// Path of the JSON request template (`ISSUANCE_REQUEST_TEMPLATE`)
    pub request_template: PathBuf,
    /// Issuer DID (`ISSUANCE_AUTHORITY`)
    pub authority: String,
    /// Wallet client name (`ISSUANCE_CLIENT_NAME`)
    pub client_name: Option<String>,
    /// Wallet logo (`ISSUANCE_LOGO_URL`)
    pub logo_url: Option<String>,
    /// Terms of service link (`ISSUANCE_TERMS_OF_SERVICE_URL`)
    pub terms_of_service_url: Option<String>,
    /// Credential type (`ISSUANCE_TYPE`)
    pub credential_type: String,
    /// Credential manifest URL (`ISSUANCE_MANIFEST`)
    pub manifest: String,
    /// Key the issuance service must echo in callbacks (`ISSUANCE_CALLBACK_API_KEY`)
    pub callback_api_key: Option<String>,

    /// Event table, present when `RECORD_ISSUANCE_EVENT=true`
    pub event_table: Option<EventTableConfig>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("base_url", &self.base_url)
            .field("cookie_secret", &"<redacted>")
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("scope", &self.scope)
            .field("authority_host", &self.authority_host)
            .field("issuance_endpoint", &self.issuance_endpoint)
            .field("request_template", &self.request_template)
            .field("authority", &self.authority)
            .field("credential_type", &self.credential_type)
            .field("manifest", &self.manifest)
            .field("callback_api_key", &self.callback_api_key.as_ref().map(|_| "<redacted>"))
            .field("event_table", &self.event_table)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`.
    ///
    /// Blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// is malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(lookup);

        let session_ttl_secs = vars.parsed("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?;
        if session_ttl_secs <= 0 {
            return Err(ConfigError::Invalid {
                key: "SESSION_TTL_SECS",
                message: "must be positive".to_string(),
            });
        }

        let record_events = vars
            .optional("RECORD_ISSUANCE_EVENT")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));
        let event_table = if record_events {
            Some(EventTableConfig {
                account: vars.required("EVENT_TABLE_ACCOUNT")?,
                table: vars.required("EVENT_TABLE_NAME")?,
                sas_token: vars.required("EVENT_TABLE_SAS_TOKEN")?,
            })
        } else {
            None
        };

        Ok(Self {
            host: vars
                .optional("HOST")
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            port: vars.parsed("PORT", 3000)?,
            base_url: vars.required("BASE_URL")?,
            cookie_secret: vars.required("COOKIE_SECRET")?,
            session_ttl_secs,
            tenant_id: vars.required("VC_TENANT_ID")?,
            client_id: vars.required("VC_CLIENT_ID")?,
            client_secret: vars.required("VC_CLIENT_SECRET")?,
            scope: vars
                .optional("VC_SCOPE")
                .unwrap_or_else(|| DEFAULT_VERIFIED_ID_SCOPE.to_string()),
            authority_host: vars
                .optional("VC_AUTHORITY_HOST")
                .unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.to_string()),
            issuance_endpoint: vars
                .optional("ISSUANCE_API_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_ISSUANCE_ENDPOINT.to_string()),
            request_template: PathBuf::from(vars.required("ISSUANCE_REQUEST_TEMPLATE")?),
            authority: vars.required("ISSUANCE_AUTHORITY")?,
            client_name: vars.optional("ISSUANCE_CLIENT_NAME"),
            logo_url: vars.optional("ISSUANCE_LOGO_URL"),
            terms_of_service_url: vars.optional("ISSUANCE_TERMS_OF_SERVICE_URL"),
            credential_type: vars.required("ISSUANCE_TYPE")?,
            manifest: vars.required("ISSUANCE_MANIFEST")?,
            callback_api_key: vars.optional("ISSUANCE_CALLBACK_API_KEY"),
            event_table,
        })
    }

    /// Socket address to bind, as `host:port`.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Session lifetime.
    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::seconds(self.session_ttl_secs)
    }

    /// Whether successful issuances are recorded.
    #[must_use]
    pub const fn records_issuance_events(&self) -> bool {
        self.event_table.is_some()
    }

    /// Issuance configuration for [`vc_issuer::IssuanceService`].
    #[must_use]
    pub fn issuance_config(&self) -> IssuanceConfig {
        let mut config = IssuanceConfig::new(
            self.base_url.clone(),
            self.authority.clone(),
            self.credential_type.clone(),
            self.manifest.clone(),
        )
        .with_record_issuance_events(self.records_issuance_events());

        if let Some(client_name) = &self.client_name {
            config = config.with_client_name(client_name.clone());
        }
        if let Some(logo_url) = &self.logo_url {
            config = config.with_logo_url(logo_url.clone());
        }
        if let Some(url) = &self.terms_of_service_url {
            config = config.with_terms_of_service_url(url.clone());
        }
        if let Some(api_key) = &self.callback_api_key {
            config = config.with_callback_api_key(api_key.clone());
        }

        config
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.optional(key).ok_or(ConfigError::Missing(key))
    }

    fn parsed<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |v| {
            v.parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                message: e.to_string(),
            })
        })
    }
}
