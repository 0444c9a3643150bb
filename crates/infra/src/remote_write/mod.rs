//! Prometheus remote-write wire format.
//!
//! The body of a remote-write request is a protobuf `WriteRequest`
//! compressed with the Snappy block format (not the framed format).

pub mod encoder;
pub mod proto;

pub use encoder::{decode_write_request, encode_write_request, EncodeError};
