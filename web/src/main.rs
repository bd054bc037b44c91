//! Verifiable credential issuer HTTP server.
//!
//! Serves the issuance request, callback and status endpoints against the
//! Entra token endpoint and the Verified ID issuance API.

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vc_issuer::providers::{
    ClientCredentialTokenProvider, IssuanceEventLog, TableStorageEventLog, VerifiedIdClient,
};
use vc_issuer::stores::{InMemoryEventLog, InMemorySessionStore};
use vc_issuer::{IssuanceRequest, IssuanceService, IssuerEnvironment};
use vc_issuer_web::{AppState, Config, build_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the process environment is used as is
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vc_issuer=info,vc_issuer_web=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting verifiable credential issuer");
    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    // Load configuration
    let config = Config::from_env().context("Invalid configuration")?;
    info!(
        base_url = %config.base_url,
        issuance_endpoint = %config.issuance_endpoint,
        credential_type = %config.credential_type,
        record_issuance_events = config.records_issuance_events(),
        "Configuration loaded"
    );

    let template = IssuanceRequest::from_file(&config.request_template)
        .context("Could not load the issuance request template")?;
    info!(
        path = %config.request_template.display(),
        pin_length = ?template.pin_length(),
        "Issuance request template loaded"
    );

    match &config.event_table {
        Some(table) => {
            let event_log =
                TableStorageEventLog::new(&table.account, table.table.clone(), &table.sas_token);
            info!(account = %table.account, table = %table.table, "Recording issuance events");
            serve(&config, template, event_log).await
        }
        None => serve(&config, template, InMemoryEventLog::new()).await,
    }
}

/// Wire the providers together and run the server until shutdown.
async fn serve<L>(config: &Config, template: IssuanceRequest, event_log: L) -> anyhow::Result<()>
where
    L: IssuanceEventLog + Clone + 'static,
{
    let sessions = InMemorySessionStore::new(config.session_ttl());
    let tokens = ClientCredentialTokenProvider::new(
        config.tenant_id.clone(),
        config.client_id.clone(),
        config.client_secret.clone(),
    )
    .with_scope(config.scope.clone())
    .with_authority_host(config.authority_host.clone());
    let issuance_api = VerifiedIdClient::new().with_endpoint(config.issuance_endpoint.clone());

    let env = IssuerEnvironment::new(sessions, tokens, issuance_api, event_log);
    let service = IssuanceService::new(env, config.issuance_config(), template);
    let state = AppState::new(service, &config.cookie_secret);

    // Build router
    let app = build_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Could not bind {addr}"))?;
    info!(address = %addr, "Server listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
