//! Error types for NATS operations.

use std::time::Duration;

/// Result type for all NATS operations in this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Unified error type for NATS operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// NATS client/connection errors.
    #[error("NATS connection error: {0}")]
    Connection(#[source] async_nats::Error),

    /// Operation timeout.
    #[error("Operation timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// Stream lookup failed.
    #[error("Stream operation failed on '{stream}': {error}")]
    StreamError { stream: String, error: String },

    /// Consumer operation failed.
    #[error("Consumer '{consumer}' error: {reason}")]
    ConsumerError { consumer: String, reason: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Generic operation error with context.
    #[error("NATS operation failed: {operation} - {details}")]
    Operation { operation: String, details: String },
}

impl Error {
    /// Create a stream error.
    pub fn stream_error(stream: impl Into<String>, error: impl Into<String>) -> Self {
        Self::StreamError {
            stream: stream.into(),
            error: error.into(),
        }
    }

    /// Create a consumer error.
    pub fn consumer_error(consumer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConsumerError {
            consumer: consumer.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create an operation error with context.
    pub fn operation(op: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Operation {
            operation: op.into(),
            details: details.into(),
        }
    }

    /// Returns the core error kind this error maps to.
    ///
    /// Anything that happens while acquiring the subscription is fatal;
    /// failures during a fetch only cost one poll.
    pub fn kind(&self) -> apisync_core::ErrorKind {
        use apisync_core::ErrorKind;

        match self {
            Error::Connection(_)
            | Error::Timeout { .. }
            | Error::StreamError { .. }
            | Error::ConsumerError { .. } => ErrorKind::Connection,
            Error::InvalidConfig { .. } => ErrorKind::Configuration,
            Error::Operation { .. } => ErrorKind::Transport,
        }
    }
}

impl From<Error> for apisync_core::Error {
    fn from(error: Error) -> Self {
        let kind = error.kind();
        apisync_core::Error::new(kind)
            .with_message(error.to_string())
            .with_source(error)
    }
}
