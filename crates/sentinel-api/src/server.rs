//! HTTP server lifecycle.

use std::future::Future;
use std::time::Duration;

use sentinel_core::{Error, Result};
use tokio::net::TcpListener;

use crate::config::SentinelConfig;
use crate::routes::router;
use crate::state::AppState;

pub struct SentinelServer {
    config: SentinelConfig,
    state: AppState,
}

impl SentinelServer {
    pub fn new(config: SentinelConfig) -> Result<Self> {
        let state = AppState::from_config(&config)?;
        Ok(Self { config, state })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve until `shutdown` resolves, then stop the engine timers.
    pub async fn run(self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
        let engine = self.state.engine.clone();

        if self.config.http.refresh_on_start {
            match engine.refresh_cameras().await {
                Ok(count) => tracing::info!(count, "cameras loaded"),
                Err(e) => tracing::warn!("camera refresh failed: {e}"),
            }
        }
        engine.start();

        let addr = self.config.http.bind_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Network(format!("failed to bind {addr}: {e}")))?;
        tracing::info!(%addr, "sentinel listening");

        let served = axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| Error::Network(e.to_string()));

        let grace = Duration::from_secs(self.config.http.shutdown_grace_secs);
        if tokio::time::timeout(grace, engine.shutdown()).await.is_err() {
            tracing::warn!(?grace, "engine shutdown timed out");
        }
        tracing::info!("sentinel stopped");
        served
    }
}

/// Resolves on Ctrl-C
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
