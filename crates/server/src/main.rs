//! Token Aggregator
//!
//! Main entry point for the HTTP/WebSocket server

use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tokenagg_server::{settings, ApiServerBuilder, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting Token Aggregator v{}", env!("CARGO_PKG_VERSION"));

    let config = settings::load()?;
    let state = AppState::from_config(&config)?;
    info!("Cache mode: {}", state.cache.mode().name());

    // Start background services
    let health_monitor = state
        .cache
        .spawn_health_monitor(config.cache.health_check_interval());
    if config.refresh.enabled {
        state.refresh.start();
    }
    info!("Background services started");

    let server = ApiServerBuilder::new(state.clone())
        .config(config.server.clone())
        .build();
    let listener = server.bind().await?;

    // Setup shutdown channel
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    // Spawn shutdown signal handler
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
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
                    error!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received Ctrl+C");
            }
            _ = terminate => {
                info!("Received termination signal");
            }
        }

        let _ = shutdown_tx.send(());
    });

    info!("Press Ctrl+C to shutdown");

    let result = server.serve_with_shutdown(listener, shutdown_rx).await;

    state.refresh.stop();
    if let Some(monitor) = health_monitor {
        monitor.abort();
    }

    if let Err(e) = result {
        error!("Server error: {}", e);
        return Err(e);
    }

    info!("Server shutdown complete");
    Ok(())
}
