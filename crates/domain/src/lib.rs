//! # Meterwire Domain
//!
//! Business domain types and models for meterwire.
//!
//! This crate contains:
//! - Domain data types (Reading, Series, Label, Sample)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants
//!
//! ## Architecture
//! - Depends only on `meterwire-common`
//! - Pure domain models and data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
