//! # Meterwire Infrastructure
//!
//! Everything that touches the outside world: the remote-write wire format,
//! the HTTP client, the push engine, the health endpoint and configuration
//! loading.
//!
//! ## Architecture
//! - Implements the delivery side of the pipeline defined in `meterwire-core`
//! - Depends on `meterwire-domain` for configuration and data types
//! - Contains all "impure" code (network I/O, timers, files)

pub mod config;
pub mod errors;
pub mod health;
pub mod http;
pub mod observability;
pub mod push;
pub mod remote_write;

// Re-export commonly used items
pub use errors::InfraError;
pub use health::{health_router, HealthMonitor, HealthReport, HealthServer};
pub use http::{RemoteWriteClient, RemoteWriteClientBuilder};
pub use push::{PushError, PushState, Pusher, PusherConfig, RemoteWriteForwarder};
