//! # Meterwire Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The [`SeriesBuilder`] strategy and the per-kind builders
//! - Builder composition and external-label decoration
//! - Health evaluation from push staleness
//!
//! ## Architecture Principles
//! - Only depends on `meterwire-common` and `meterwire-domain`
//! - No network, file or clock access; callers pass `now` in
//! - Pure, testable business logic

pub mod health;
pub mod series;

// Re-export commonly used items
pub use health::{HealthStatus, StalenessPolicy};
pub use series::{
    combine_builders, BleSeriesBuilder, BuildError, CombinedBuilder, ExternalLabels,
    MetricSeriesBuilder, SeriesBuilder, ThermostatSeriesBuilder,
};
