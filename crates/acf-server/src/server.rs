use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::{AppState, Backends};

/// Festival pass HTTP server.
pub struct AcfServer {
    config: ServerConfig,
    state: AppState,
}

impl AcfServer {
    /// Wire the server to the given backends. Fails if the configuration
    /// cannot support pass verification.
    pub fn new(config: ServerConfig, backends: Backends) -> ServerResult<Self> {
        let state = AppState::new(&config, backends)?;
        Ok(Self { config, state })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Serve until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        for feature in self.config.disabled_features() {
            tracing::warn!(feature, "disabled: secret not configured");
        }
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!("ACF pass server listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
