//! Structured error handling shared by every apisync crate.

use std::borrow::Cow;

use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors that can occur while syncing registry events.
///
/// Each kind corresponds to the smallest unit of work that is abandoned
/// when it occurs: one message, one generation mode, one file, or the
/// end-of-run sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Stream delivery failed for one message or one poll.
    Transport,
    /// A message payload was malformed or missed a required field.
    Decode,
    /// The artifact registry could not serve content or state.
    Fetch,
    /// The policy generator failed or produced unusable output.
    Generation,
    /// A generated file could not be written or a subtree removed.
    Write,
    /// Staging, committing or pushing the output tree failed.
    Sync,
    /// A configuration value was rejected.
    Configuration,
    /// Connecting or subscribing to an external service failed.
    Connection,
    /// Unknown error occurred.
    #[default]
    Unknown,
}

/// Structured error type with classification and context tracking.
#[must_use]
#[derive(Debug, Error)]
#[error("[{kind}]{}", message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Primary error message.
    pub message: Option<Cow<'static, str>>,
    /// Underlying source error, if any.
    #[source]
    pub source: Option<BoxedError>,
    /// Additional context information.
    pub context: Option<Cow<'static, str>>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
            context: None,
        }
    }

    /// Creates a new error from a source error.
    pub fn from_source(kind: ErrorKind, source: impl Into<BoxedError>) -> Self {
        Self {
            kind,
            message: None,
            source: Some(source.into()),
            context: None,
        }
    }

    /// Creates a transport error.
    pub fn transport() -> Self {
        Self::new(ErrorKind::Transport)
    }

    /// Creates a decode error.
    pub fn decode() -> Self {
        Self::new(ErrorKind::Decode)
    }

    /// Creates a fetch error.
    pub fn fetch() -> Self {
        Self::new(ErrorKind::Fetch)
    }

    /// Creates a generation error.
    pub fn generation() -> Self {
        Self::new(ErrorKind::Generation)
    }

    /// Creates a write error.
    pub fn write() -> Self {
        Self::new(ErrorKind::Write)
    }

    /// Creates a sync error.
    pub fn sync() -> Self {
        Self::new(ErrorKind::Sync)
    }

    /// Creates a configuration error.
    pub fn configuration() -> Self {
        Self::new(ErrorKind::Configuration)
    }

    /// Creates a connection error.
    pub fn connection() -> Self {
        Self::new(ErrorKind::Connection)
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the source of the error.
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Adds context to the error.
    pub fn with_context(mut self, context: impl Into<Cow<'static, str>>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::from_source(ErrorKind::Decode, error).with_message("Invalid JSON document")
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(error: std::str::Utf8Error) -> Self {
        Self::from_source(ErrorKind::Decode, error).with_message("Invalid UTF-8 encoding")
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_error_new() {
        let error = Error::new(ErrorKind::Unknown);
        assert_eq!(error.kind, ErrorKind::Unknown);
        assert!(error.message.is_none());
        assert!(error.source.is_none());
        assert!(error.context.is_none());
    }

    #[test]
    fn test_error_builder_pattern() {
        let error = Error::fetch()
            .with_message("artifact not found")
            .with_context("shop/orders-api/1");

        assert_eq!(error.kind, ErrorKind::Fetch);
        assert_eq!(error.message.as_deref(), Some("artifact not found"));
        assert_eq!(error.context.as_deref(), Some("shop/orders-api/1"));
    }

    #[test]
    fn test_error_display() {
        let error = Error::generation().with_message("kuadrantctl exited with status 1");
        let display_str = error.to_string();
        assert!(display_str.contains("generation"));
        assert!(display_str.contains("kuadrantctl exited"));
    }

    #[test]
    fn test_error_from_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = Error::from(json_error);
        assert_eq!(error.kind, ErrorKind::Decode);
        assert!(error.source.is_some());
    }

    #[test]
    fn test_from_str() {
        assert_eq!(ErrorKind::from_str("fetch").unwrap(), ErrorKind::Fetch);
        assert_eq!(ErrorKind::from_str("write").unwrap(), ErrorKind::Write);
        assert!(ErrorKind::from_str("invalid").is_err());
        assert_eq!(ErrorKind::default(), ErrorKind::Unknown);
    }
}
