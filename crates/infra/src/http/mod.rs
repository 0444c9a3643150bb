//! HTTP client for the remote-write endpoint.

pub mod client;

pub use client::{RemoteWriteClient, RemoteWriteClientBuilder};
