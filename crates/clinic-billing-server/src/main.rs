use anyhow::Context;
use tokio::net::TcpListener;

use clinic_billing_server::config::APP_VERSION;
use clinic_billing_server::{app, init_tracing, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("Failed to load configuration")?;
    init_tracing(&config.log_filter);

    tracing::info!("Clinic billing server starting v{APP_VERSION}");

    let state = AppState::open(&config)
        .with_context(|| format!("Failed to open database at {}", config.db_path))?;

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    let addr = listener.local_addr().context("Failed to get server address")?;
    tracing::info!(%addr, db = %config.db_path, "Server listening");

    axum::serve(listener, app(state, &config))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
