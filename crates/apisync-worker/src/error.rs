//! Worker error types.

use std::borrow::Cow;

/// Result type alias for worker operations.
pub type Result<T, E = WorkerError> = std::result::Result<T, E>;

/// Worker error type.
///
/// Only raised while setting the worker up. Once the loop runs, failures
/// are logged per unit of work instead of being returned.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// A setting was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(Cow<'static, str>),

    /// The output root could not be determined or prepared.
    #[error("output root unavailable: {message}")]
    OutputRoot {
        message: Cow<'static, str>,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl WorkerError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Creates an output root error with an I/O source.
    pub fn output_root(message: impl Into<Cow<'static, str>>, source: std::io::Error) -> Self {
        Self::OutputRoot {
            message: message.into(),
            source: Some(source),
        }
    }
}

impl From<WorkerError> for apisync_core::Error {
    fn from(err: WorkerError) -> Self {
        apisync_core::Error::configuration()
            .with_message(err.to_string())
            .with_source(err)
    }
}
