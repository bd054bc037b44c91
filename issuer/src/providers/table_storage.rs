//! Azure Table Storage issuance event log.

use crate::error::{IssuerError, Result};
use crate::providers::{IssuanceEvent, IssuanceEventLog};
use reqwest::Client;
use serde_json::json;

/// Table service REST API version.
const TABLE_API_VERSION: &str = "2019-02-02";

/// Event log appending one entity per issuance to an Azure table.
///
/// Entities are partitioned by credential type and keyed by the event id:
///
/// ```json
/// {
///   "PartitionKey": "VerifiedEmployee",
///   "RowKey": "5f0c3b8e-9a4e-4a58-9d3e-0d1c7d0f6b21",
///   "email": "alice@example.com",
///   "name": "Alice",
///   "issuedAt": "2024-05-01T12:00:00Z"
/// }
/// ```
///
/// Authorization is a SAS token with `add` permission on the table.
#[derive(Clone)]
pub struct TableStorageEventLog {
    /// Table service endpoint (`https://{account}.table.core.windows.net`).
    endpoint: String,

    /// Table name.
    table: String,

    /// SAS token query string, without the leading `?`.
    sas_token: String,

    /// HTTP client for making requests.
    http_client: Client,
}

impl TableStorageEventLog {
    /// Create an event log for `table` in storage account `account`.
    #[must_use]
    pub fn new(account: &str, table: impl Into<String>, sas_token: &str) -> Self {
        Self {
            endpoint: format!("https://{account}.table.core.windows.net"),
            table: table.into(),
            sas_token: sas_token.trim_start_matches('?').to_string(),
            http_client: Client::new(),
        }
    }

    /// Override the table service endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Insert URL of the table.
    #[must_use]
    pub fn insert_url(&self) -> String {
        format!(
            "{}/{}?{}",
            self.endpoint.trim_end_matches('/'),
            self.table,
            self.sas_token
        )
    }
}

impl std::fmt::Debug for TableStorageEventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableStorageEventLog")
            .field("endpoint", &self.endpoint)
            .field("table", &self.table)
            .field("sas_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl IssuanceEventLog for TableStorageEventLog {
    async fn record(&self, event: &IssuanceEvent) -> Result<()> {
        let entity = json!({
            "PartitionKey": event.credential_type,
            "RowKey": event.event_id.to_string(),
            "email": event.email,
            "name": event.name,
            "issuedAt": event.issued_at.to_rfc3339(),
        });

        let response = self
            .http_client
            .post(self.insert_url())
            .header("Accept", "application/json;odata=nometadata")
            .header("Prefer", "return-no-content")
            .header("x-ms-version", TABLE_API_VERSION)
            .json(&entity)
            .send()
            .await
            .map_err(|e| IssuerError::EventLogFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            tracing::error!(%status, table = %self.table, "Table insert failed: {}", error_body);
            return Err(IssuerError::EventLogFailed(format!(
                "Table service returned {status}"
            )));
        }

        Ok(())
    }
}
