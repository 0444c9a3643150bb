//! Time-series construction from buffered readings.
//!
//! A [`SeriesBuilder`] is a pure transform `&[Reading] -> Vec<Series>`. Each
//! concrete builder handles one reading kind and silently skips the others,
//! so several builders can run over the same batch and be merged with
//! [`combine_builders`].
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use meterwire_core::series::{
//!     combine_builders, BleSeriesBuilder, MetricSeriesBuilder, SeriesBuilder,
//! };
//!
//! let builders: Vec<Arc<dyn SeriesBuilder>> =
//!     vec![Arc::new(BleSeriesBuilder::new()), Arc::new(MetricSeriesBuilder::new())];
//! let builder = combine_builders(builders);
//! assert!(builder.build(&[]).unwrap().is_empty());
//! ```

mod ble;
mod combine;
mod grouping;
mod metric;
mod thermostat;

pub use ble::{
    BleSeriesBuilder, BLE_BATTERY_PERCENT, BLE_BATTERY_VOLTAGE_VOLTS, BLE_HUMIDITY_PERCENT,
    BLE_RSSI_DBM, BLE_TEMPERATURE_CELSIUS,
};
pub use combine::{combine_builders, CombinedBuilder, ExternalLabels};
pub use metric::{is_valid_label_name, is_valid_metric_name, MetricSeriesBuilder};
use meterwire_domain::{Reading, Series, SeriesError};
pub use thermostat::{
    ThermostatSeriesBuilder, THERMOSTAT_HEATING_POWER_PERCENT, THERMOSTAT_HUMIDITY_PERCENT,
    THERMOSTAT_SETPOINT_CELSIUS, THERMOSTAT_TEMPERATURE_CELSIUS,
};
use thiserror::Error;

/// Failures raised while turning readings into series.
///
/// Build errors are deterministic: the same batch fails the same way every
/// time, so callers drop the batch instead of retrying it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("invalid metric name: {0:?}")]
    InvalidMetricName(String),

    #[error("invalid label name {label:?} on metric {metric:?}")]
    InvalidLabelName { metric: String, label: String },

    #[error("external label {0:?} collides with a label set by the builder")]
    LabelCollision(String),

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error("{0}")]
    Custom(String),
}

/// Strategy turning a batch of readings into remote-write series.
pub trait SeriesBuilder: Send + Sync {
    /// Builds every series the batch contributes to.
    ///
    /// # Errors
    /// Returns [`BuildError`] when the input cannot be represented.
    fn build(&self, readings: &[Reading]) -> Result<Vec<Series>, BuildError>;
}

impl<F> SeriesBuilder for F
where
    F: Fn(&[Reading]) -> Result<Vec<Series>, BuildError> + Send + Sync,
{
    fn build(&self, readings: &[Reading]) -> Result<Vec<Series>, BuildError> {
        self(readings)
    }
}
