//! Application context - dependency injection container

use std::net::SocketAddr;
use std::sync::Arc;

use meterwire_common::collections::RingBuffer;
use meterwire_core::health::StalenessPolicy;
use meterwire_core::series::{
    combine_builders, BleSeriesBuilder, ExternalLabels, MetricSeriesBuilder, SeriesBuilder,
    ThermostatSeriesBuilder,
};
use meterwire_domain::{Config, MeterwireError, Reading, Result, SeriesConfig};
use meterwire_infra::health::{HealthMonitor, HealthServer};
use meterwire_infra::http::RemoteWriteClient;
use meterwire_infra::observability::metrics::PushMetrics;
use meterwire_infra::push::{Pusher, PusherConfig, RemoteWriteForwarder};
use tracing::{error, info, instrument, warn};

/// Application context - holds the pipeline and its background tasks
pub struct AppContext {
    pub config: Config,
    buffer: Arc<RingBuffer<Reading>>,
    pusher: Pusher,
    health_monitor: Arc<HealthMonitor>,
    health_server: Option<HealthServer>,
}

impl AppContext {
    /// Build every component from a validated configuration.
    ///
    /// Nothing runs until [`start`](Self::start).
    pub fn new(config: Config) -> Result<Self> {
        let client = RemoteWriteClient::from_config(&config.remote_write)?;
        Self::with_forwarder(config, Arc::new(client))
    }

    /// Like [`new`](Self::new) but delivering through `forwarder`.
    pub fn with_forwarder(
        config: Config,
        forwarder: Arc<dyn RemoteWriteForwarder>,
    ) -> Result<Self> {
        config.validate()?;

        let buffer = Arc::new(
            RingBuffer::new(config.buffer.capacity)
                .map_err(|e| MeterwireError::Config(e.to_string()))?,
        );

        let pusher = Pusher::new(
            Arc::clone(&buffer),
            build_series_builder(&config.series),
            forwarder,
            PusherConfig::from(&config.push),
            Arc::new(PushMetrics::new()),
        );

        let health_monitor = Arc::new(HealthMonitor::new(
            Arc::clone(&buffer),
            pusher.state(),
            StalenessPolicy::new(config.push.interval(), config.health.staleness_factor),
        ));

        let health_server = if config.health.enabled {
            let addr: SocketAddr = config.health.bind_address.parse().map_err(|e| {
                MeterwireError::Config(format!(
                    "invalid health bind address {:?}: {e}",
                    config.health.bind_address
                ))
            })?;
            Some(HealthServer::new(Arc::clone(&health_monitor), addr))
        } else {
            None
        };

        info!(
            endpoint = %config.remote_write.endpoint,
            capacity = config.buffer.capacity,
            interval_secs = config.push.interval_secs,
            health_enabled = config.health.enabled,
            "Application context created"
        );

        Ok(Self { config, buffer, pusher, health_monitor, health_server })
    }

    /// Start the health server (if enabled) and the push loop.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> Result<()> {
        if let Some(server) = self.health_server.as_mut() {
            server.start().await?;
        }

        if let Err(err) = self.pusher.start().await {
            error!(error = %err, "failed to start pusher");
            if let Some(server) = self.health_server.as_mut() {
                if let Err(stop_err) = server.stop().await {
                    warn!(error = %stop_err, "health server did not stop cleanly");
                }
            }
            return Err(err.into());
        }

        info!("Meterwire started");
        Ok(())
    }

    /// Stop the push loop (with its final flush), then the health server.
    ///
    /// Both are attempted; the first failure is returned.
    #[instrument(skip(self))]
    pub async fn shutdown(&mut self) -> Result<()> {
        let mut first_error: Option<MeterwireError> = None;

        if self.pusher.is_running() {
            if let Err(err) = self.pusher.stop().await {
                error!(error = %err, "pusher did not stop cleanly");
                first_error.get_or_insert(err.into());
            }
        }

        if let Some(server) = self.health_server.as_mut() {
            if server.is_running() {
                if let Err(err) = server.stop().await {
                    error!(error = %err, "health server did not stop cleanly");
                    first_error.get_or_insert(err.into());
                }
            }
        }

        info!(buffered = self.buffer.size(), "Meterwire stopped");
        first_error.map_or(Ok(()), Err)
    }

    /// Shared buffer that producers add readings to.
    pub fn buffer(&self) -> Arc<RingBuffer<Reading>> {
        Arc::clone(&self.buffer)
    }

    pub fn pusher(&self) -> &Pusher {
        &self.pusher
    }

    pub fn health(&self) -> Arc<HealthMonitor> {
        Arc::clone(&self.health_monitor)
    }

    /// Bound health address while the server is running.
    pub fn health_address(&self) -> Option<SocketAddr> {
        self.health_server.as_ref().and_then(HealthServer::local_addr)
    }

    pub fn is_running(&self) -> bool {
        self.pusher.is_running()
    }
}

/// BLE, thermostat and metric builders with configured quantization and
/// external labels.
pub fn build_series_builder(config: &SeriesConfig) -> Arc<dyn SeriesBuilder> {
    let builders: Vec<Arc<dyn SeriesBuilder>> = vec![
        Arc::new(BleSeriesBuilder::new().with_quantization(config.ble_quantization)),
        Arc::new(ThermostatSeriesBuilder::new().with_quantization(config.thermostat_quantization)),
        Arc::new(MetricSeriesBuilder::new().with_quantization(config.metric_quantization)),
    ];
    let combined = combine_builders(builders);

    if config.external_labels.is_empty() {
        Arc::new(combined)
    } else {
        Arc::new(ExternalLabels::new(combined, config.external_labels.clone()))
    }
}
