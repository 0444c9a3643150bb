//! HTTP surface for health checks.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use meterwire_domain::MeterwireError;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use super::HealthMonitor;

#[derive(Debug, Error)]
pub enum HealthError {
    #[error("Failed to bind health server to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Health server already running")]
    AlreadyRunning,

    #[error("Health server not running")]
    NotRunning,

    #[error("Health server failed to stop: {0}")]
    Shutdown(String),
}

impl From<HealthError> for MeterwireError {
    fn from(err: HealthError) -> Self {
        match err {
            HealthError::Bind { .. } => Self::Config(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Router serving `GET /health`: 200 when healthy, 503 otherwise.
pub fn health_router(monitor: Arc<HealthMonitor>) -> Router {
    Router::new().route("/health", get(health_check)).with_state(monitor)
}

async fn health_check(State(monitor): State<Arc<HealthMonitor>>) -> impl IntoResponse {
    let report = monitor.report();
    let code =
        if report.status.is_healthy() { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (code, Json(report))
}

/// Background health endpoint with graceful shutdown.
pub struct HealthServer {
    monitor: Arc<HealthMonitor>,
    bind_address: SocketAddr,
    join_timeout: Duration,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
    local_addr: Option<SocketAddr>,
}

impl HealthServer {
    pub fn new(monitor: Arc<HealthMonitor>, bind_address: SocketAddr) -> Self {
        Self {
            monitor,
            bind_address,
            join_timeout: Duration::from_secs(5),
            cancellation: CancellationToken::new(),
            task_handle: None,
            local_addr: None,
        }
    }

    /// Bind the listener and start serving; returns the bound address.
    #[instrument(skip(self), fields(bind_address = %self.bind_address))]
    pub async fn start(&mut self) -> Result<SocketAddr, HealthError> {
        if self.is_running() {
            return Err(HealthError::AlreadyRunning);
        }

        let listener = TcpListener::bind(self.bind_address)
            .await
            .map_err(|source| HealthError::Bind { addr: self.bind_address, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| HealthError::Bind { addr: self.bind_address, source })?;

        self.cancellation = CancellationToken::new();
        let cancel = self.cancellation.clone();
        let app = health_router(Arc::clone(&self.monitor));

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(async move { cancel.cancelled().await })
                .await
            {
                warn!(error = %e, "Health server terminated with error");
            }
        });

        self.task_handle = Some(handle);
        self.local_addr = Some(local_addr);
        info!(address = %local_addr, "Health server listening");

        Ok(local_addr)
    }

    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Result<(), HealthError> {
        let Some(handle) = self.task_handle.take() else {
            return Err(HealthError::NotRunning);
        };

        self.cancellation.cancel();
        self.local_addr = None;

        match tokio::time::timeout(self.join_timeout, handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!("Health server task panicked: {}", e);
                return Err(HealthError::Shutdown("health task panicked".to_string()));
            }
            Err(_) => {
                warn!("Health server did not stop within timeout");
                return Err(HealthError::Shutdown("health task join timed out".to_string()));
            }
        }

        info!("Health server stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.task_handle.is_some()
    }

    /// Address actually bound, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

impl Drop for HealthServer {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("HealthServer dropped while running; cancelling tasks");
            self.cancellation.cancel();
        }
    }
}
