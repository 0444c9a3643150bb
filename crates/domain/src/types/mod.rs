//! Domain types and models
//!
//! - [`reading`]: observations produced by external collectors
//! - [`series`]: labeled time series handed to the remote-write encoder

pub mod reading;
pub mod series;

pub use reading::{BleReading, MetricReading, Reading, ReadingKind, ThermostatReading};
pub use series::{Label, Sample, Series, SeriesError};
