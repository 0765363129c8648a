//! HTTP server configuration and startup

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;

use tokenagg_core::ServerConfig;

use crate::routes::router;
use crate::state::AppState;

/// HTTP server wrapper
pub struct ApiServer {
    config: ServerConfig,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Get server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    pub async fn bind(&self) -> anyhow::Result<TcpListener> {
        let addr: SocketAddr = self.address().parse()?;
        Ok(TcpListener::bind(addr).await?)
    }

    /// Serve on `listener` until `shutdown` fires, then drain connections
    pub async fn serve_with_shutdown(
        &self,
        listener: TcpListener,
        shutdown: tokio::sync::oneshot::Receiver<()>,
    ) -> anyhow::Result<()> {
        info!("HTTP server listening on {}", listener.local_addr()?);

        axum::serve(listener, router(self.state.clone()))
            .with_graceful_shutdown(async {
                shutdown.await.ok();
                info!("Shutdown signal received");
            })
            .await?;

        Ok(())
    }
}

/// Builder for server configuration
pub struct ApiServerBuilder {
    config: ServerConfig,
    state: AppState,
}

impl ApiServerBuilder {
    pub fn new(state: AppState) -> Self {
        Self {
            config: ServerConfig::default(),
            state,
        }
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn build(self) -> ApiServer {
        ApiServer::new(self.config, self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenagg_core::AppConfig;

    fn state() -> AppState {
        let mut config = AppConfig::default();
        config.cache.redis_url = String::new();
        AppState::from_config(&config).unwrap()
    }

    #[test]
    fn test_builder() {
        let server = ApiServerBuilder::new(state())
            .host("127.0.0.1")
            .port(9000)
            .build();

        assert_eq!(server.address(), "127.0.0.1:9000");
    }

    #[test]
    fn test_default_address() {
        let server = ApiServerBuilder::new(state()).build();
        assert_eq!(server.address(), "0.0.0.0:3000");
    }

    #[tokio::test]
    async fn test_shutdown_stops_serving() {
        let server = ApiServerBuilder::new(state()).host("127.0.0.1").port(0).build();
        let listener = server.bind().await.unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move { server.serve_with_shutdown(listener, rx).await });
        tx.send(()).unwrap();

        assert!(handle.await.unwrap().is_ok());
    }
}
