//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::hub::{ClientConfig, Hub};

use super::{
    auth::Authenticator,
    handler::{get_presence, health_check, list_online_users, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Default ceiling on concurrently open connections.
pub const DEFAULT_MAX_CONNECTIONS: usize = 10_000;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_connections: usize,
    pub client: ClientConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            client: ClientConfig::default(),
        }
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket エンドポイント
        .route("/ws", get(websocket_handler))
        // HTTP エンドポイント
        .route("/api/health", get(health_check))
        .route("/api/presence", get(list_online_users))
        .route("/api/presence/{user_id}", get(get_presence))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Live connection server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(hub, Arc::new(TrustedHeaderAuthenticator::default()), config);
/// server.run().await?;
/// ```
pub struct Server {
    hub: Arc<Hub>,
    authenticator: Arc<dyn Authenticator>,
    config: ServerConfig,
}

impl Server {
    pub fn new(hub: Arc<Hub>, authenticator: Arc<dyn Authenticator>, config: ServerConfig) -> Self {
        Self {
            hub,
            authenticator,
            config,
        }
    }

    /// Run the server until a shutdown signal arrives, then stop the hub.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the configured address or
    /// if there's an error during server execution.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let app_state = Arc::new(AppState::new(
            Arc::clone(&self.hub),
            self.config.client.clone(),
            self.authenticator,
            self.config.max_connections,
        ));
        let app = router(app_state);

        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!("Live connection server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        let hub = self.hub;
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                hub.shutdown().await;
            })
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
