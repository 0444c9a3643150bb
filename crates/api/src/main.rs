//! Meterwire - buffered Prometheus remote-write shipper
//!
//! Main entry point: loads configuration, starts the push pipeline and
//! waits for Ctrl-C or SIGTERM before flushing and exiting.

use anyhow::Context;
use meterwire_lib::telemetry::{init_tracing, LogFormat};
use meterwire_lib::AppContext;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before reading the log format
    let dotenv = dotenvy::dotenv();

    init_tracing(LogFormat::from_env());

    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(e) => info!(error = %e, "No .env file loaded"),
    }

    let config = meterwire_infra::config::load().context("failed to load configuration")?;

    let mut ctx = AppContext::new(config).context("failed to build application context")?;
    ctx.start().await.context("failed to start meterwire")?;

    shutdown_signal().await;
    info!("Shutdown signal received");

    if let Err(e) = ctx.shutdown().await {
        warn!(error = %e, "Shutdown completed with errors");
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
