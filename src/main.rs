// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tracing_subscriber::EnvFilter;

use crate::application::glucose_service::GlucoseService;
use crate::application::poller::Poller;
use crate::infrastructure::config::load_settings;
use crate::infrastructure::libreview_client::LibreViewClient;
use crate::presentation::app_state::AppState;
use crate::presentation::router::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("glucose_dashboard=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let settings = load_settings()?;
    tracing::debug!("Loaded settings: {:?}", settings);

    // Create vendor client (infrastructure layer)
    let client = Arc::new(LibreViewClient::new(&settings.libreview)?);

    // Create services (application layer)
    let glucose_service = GlucoseService::new(client.clone());
    let poller = Poller::new(client).start(settings.dashboard.poll_interval());

    // Create application state
    let state = Arc::new(AppState {
        glucose_service,
        dashboard: poller.subscribe(),
        dashboard_settings: settings.dashboard.clone(),
    });

    // Build router (presentation layer)
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = settings
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", settings.server.bind))?;
    tracing::info!("Starting glucose dashboard on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    poller.stop().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
