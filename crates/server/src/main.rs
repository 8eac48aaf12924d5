mod seed;

use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use api::{AppState, router};
use dinehub_core::AppConfig;
use storage::MemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let (config, overrides) = AppConfig::load_with_env().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    if !overrides.is_empty() {
        info!(?overrides, "configuration overridden from environment");
    }

    let store = Arc::new(
        MemoryStore::open(config.storage.snapshot_path.clone())
            .await
            .context("failed to open store")?,
    );
    if store.snapshot_path().is_none() {
        warn!("no storage.snapshot_path configured; data is kept in memory only");
    }

    let state = AppState::from_config(&config, store).context("failed to build application state")?;
    seed::provision_admin(&state.auth_service, &config.admin)
        .await
        .context("failed to provision admin account")?;

    let app = router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;
    info!(address = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
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
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, draining connections");
}
