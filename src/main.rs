// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::application::credential_gate::CredentialGate;
use crate::application::metrics_resolver::MetricsService;
use crate::infrastructure::config::load_settings;
use crate::infrastructure::influx_source::InfluxSource;
use crate::presentation::app_state::AppState;
use crate::presentation::router::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "line_telemetry=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration; anything missing stops startup here
    let settings = load_settings()?;

    // Create telemetry source (infrastructure layer)
    let source = Arc::new(InfluxSource::new(
        &settings.influx.url,
        &settings.influx.org,
        &settings.influx.token,
        settings.influx.query_timeout,
    ));

    // Create services (application layer)
    let metrics_service = MetricsService::new(source, settings.influx.observation_window());
    let credential_gate = CredentialGate::new(settings.credentials);
    if credential_gate.user_count() == 0 {
        tracing::warn!("No credentials configured, every login will be rejected");
    }

    let state = Arc::new(AppState {
        metrics_service,
        credential_gate,
    });

    // Build router (presentation layer)
    let router = build_router(state, &settings.server.static_dir);
    tracing::info!("Serving static files from {}", settings.server.static_dir.display());

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    tracing::info!("Starting line-telemetry service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Signal received, starting graceful shutdown");
}
