//! Conversions from external infrastructure errors into domain errors.

use meterwire_domain::MeterwireError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub MeterwireError);

impl From<InfraError> for MeterwireError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<MeterwireError> for InfraError {
    fn from(value: MeterwireError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoMeterwireError {
    fn into_meterwire(self) -> MeterwireError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → MeterwireError */
/* -------------------------------------------------------------------------- */

impl IntoMeterwireError for HttpError {
    fn into_meterwire(self) -> MeterwireError {
        if self.is_timeout() {
            return MeterwireError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return MeterwireError::Network(format!("HTTP connection failure: {self}"));
        }

        if self.is_builder() {
            return MeterwireError::Config(format!("invalid HTTP request: {self}"));
        }

        MeterwireError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_meterwire())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
