//! Remote-write push engine.

pub mod errors;
pub mod pusher;
pub mod state;

pub use errors::{PushError, PushErrorCategory};
pub use pusher::{backoff_delay, CycleSummary, Pusher, PusherConfig, RemoteWriteForwarder};
pub use state::PushState;
