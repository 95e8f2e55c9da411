use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use inquiry_backend::core::config::ConfigService;
use inquiry_backend::core::logging;
use inquiry_backend::server;
use inquiry_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_service = ConfigService::from_env();
    let config = config_service
        .load()
        .with_context(|| format!("Failed to load {}", config_service.config_path().display()))?;
    logging::init(&config.logging, &config.app);

    match serde_json::to_value(&config) {
        Ok(value) => tracing::debug!(
            config = %config_service.redact_sensitive_values(&value),
            "Effective configuration"
        ),
        Err(err) => tracing::warn!("Failed to render configuration: {}", err),
    }

    let bind_addr = format!("{}:{}", config.app.host, config.app.port);
    let shutdown = CancellationToken::new();
    let state = AppState::initialize(config, shutdown.clone()).await?;

    if !state.provider.health_check().await.unwrap_or(false) {
        tracing::warn!(
            provider = state.provider.name(),
            "LLM provider is not reachable; inquiries will fail until it is"
        );
    }

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    let app: Router = server::router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {}", err);
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

    tracing::info!("Shutdown signal received; cancelling in-flight requests");
    shutdown.cancel();
}
