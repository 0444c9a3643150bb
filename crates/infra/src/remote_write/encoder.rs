//! `Series` → Snappy-compressed `WriteRequest` bytes.

use meterwire_domain::{Label, Sample, Series};
use prost::Message;
use thiserror::Error;

use super::proto;

/// Deterministic encoding failures. Retrying them cannot succeed.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to serialize write request: {0}")]
    Protobuf(#[from] prost::EncodeError),

    #[error("failed to decode write request: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("snappy compression failed: {0}")]
    Compression(#[from] snap::Error),
}

impl From<&Series> for proto::TimeSeries {
    fn from(series: &Series) -> Self {
        Self {
            labels: series
                .labels()
                .iter()
                .map(|l| proto::Label { name: l.name.clone(), value: l.value.clone() })
                .collect(),
            samples: series
                .samples()
                .iter()
                .map(|s| proto::Sample { value: s.value, timestamp: s.timestamp_ms })
                .collect(),
        }
    }
}

/// Builds the protobuf message for a batch of series.
pub fn to_write_request(series: &[Series]) -> proto::WriteRequest {
    proto::WriteRequest { timeseries: series.iter().map(proto::TimeSeries::from).collect() }
}

/// Serializes and compresses a batch of series into a request body.
///
/// # Errors
/// Returns [`EncodeError`] if serialization or compression fails.
pub fn encode_write_request(series: &[Series]) -> Result<Vec<u8>, EncodeError> {
    let request = to_write_request(series);

    let mut bytes: Vec<u8> = Vec::with_capacity(request.encoded_len());
    request.encode(&mut bytes)?;

    let mut encoder = snap::raw::Encoder::new();
    Ok(encoder.compress_vec(&bytes)?)
}

/// Decompresses and parses a request body. Used for diagnostics and tests.
///
/// # Errors
/// Returns [`EncodeError`] if the body is not valid Snappy or protobuf.
pub fn decode_write_request(body: &[u8]) -> Result<proto::WriteRequest, EncodeError> {
    let mut decoder = snap::raw::Decoder::new();
    let bytes = decoder.decompress_vec(body)?;
    Ok(proto::WriteRequest::decode(bytes.as_slice())?)
}

/// Converts a decoded time series back into domain labels and samples.
pub fn series_parts(ts: &proto::TimeSeries) -> (Vec<Label>, Vec<Sample>) {
    let labels = ts.labels.iter().map(|l| Label::new(l.name.as_str(), l.value.as_str())).collect();
    let samples = ts.samples.iter().map(|s| Sample::new(s.value, s.timestamp)).collect();
    (labels, samples)
}
