//! HTTP server bootstrap and graceful shutdown.

use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::core::{Config, ServerState};
use crate::utils::{AppError, AppResult};

pub struct Server {
    state: ServerState,
    shutdown: CancellationToken,
}

impl Server {
    pub async fn new(config: Config) -> AppResult<Self> {
        let state = ServerState::initialize(&config).await?;
        Ok(Self {
            state,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Bind and serve until the shutdown token fires or ctrl-c arrives.
    pub async fn run(self) -> AppResult<()> {
        let app = api::router(self.state.clone())
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(Duration::from_millis(
                self.state.config.request_timeout_ms,
            )));

        let addr = format!("0.0.0.0:{}", self.state.config.http_port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| AppError::internal(format!("bind {addr}: {e}")))?;

        tracing::info!(%addr, "commerce server listening");

        let shutdown = self.shutdown.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown.cancelled() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
                tracing::info!("shutdown signal received");
            })
            .await
            .map_err(|e| AppError::internal(format!("server error: {e}")))?;

        tracing::info!("server stopped");
        Ok(())
    }
}
