//! Message stream abstraction consumed by the batch loop.

use std::time::Duration;

use bytes::Bytes;

use crate::{Error, Result};

/// One message pulled from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// Subject or topic the message was published on.
    pub subject: String,
    /// Position of the message in its stream, when the transport knows it.
    pub sequence: Option<u64>,
    /// Undecoded message body.
    pub payload: Bytes,
}

impl RawMessage {
    /// Creates a message without stream position.
    pub fn new(subject: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            subject: subject.into(),
            sequence: None,
            payload: payload.into(),
        }
    }

    /// Sets the stream position.
    #[must_use]
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = Some(sequence);
        self
    }
}

/// One item of a polled batch.
#[derive(Debug)]
pub enum Delivery {
    /// A message to decode and dispatch.
    Message(RawMessage),
    /// The consumer has caught up with the end of the stream.
    ///
    /// Informational only; never an error.
    EndOfPartition,
    /// The transport failed to deliver one message.
    Error(Error),
}

/// A subscribed message stream.
///
/// Implementations are owned by exactly one consumption loop, which calls
/// [`EventSource::close`] once on every exit path.
#[async_trait::async_trait]
pub trait EventSource: Send {
    /// Pulls up to `max_messages` deliveries, waiting at most `timeout`.
    ///
    /// An empty vector means nothing arrived before the timeout.
    ///
    /// # Errors
    ///
    /// Returns a [`Transport`](crate::ErrorKind::Transport) error when the
    /// poll request itself failed.
    async fn poll(&mut self, max_messages: usize, timeout: Duration) -> Result<Vec<Delivery>>;

    /// Releases the subscription.
    async fn close(&mut self) -> Result<()>;
}
