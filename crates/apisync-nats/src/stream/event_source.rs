use std::fmt;
use std::time::Duration;

use apisync_core::{Delivery, EventSource, RawMessage};
use async_nats::jetstream::consumer::PullConsumer;
use async_nats::jetstream::stream::Stream;
use async_nats::jetstream::Message;
use futures::StreamExt;

use crate::{Error, TRACING_TARGET_STREAM};

/// Event source reading one topic through an ephemeral pull consumer.
///
/// Created by [`NatsClient::subscribe`](crate::NatsClient::subscribe).
pub struct JetStreamEventSource {
    stream: Stream,
    consumer: PullConsumer,
    consumer_name: String,
    closed: bool,
}

impl fmt::Debug for JetStreamEventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JetStreamEventSource")
            .field("consumer_name", &self.consumer_name)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl JetStreamEventSource {
    pub(crate) fn new(stream: Stream, consumer: PullConsumer, consumer_name: String) -> Self {
        Self {
            stream,
            consumer,
            consumer_name,
            closed: false,
        }
    }

    /// Returns the name of the underlying consumer.
    pub fn consumer_name(&self) -> &str {
        &self.consumer_name
    }
}

/// Converts one fetched message, appending an end-of-partition marker
/// when the consumer has caught up with the stream.
fn push_message(deliveries: &mut Vec<Delivery>, message: &Message) {
    let mut raw = RawMessage::new(message.subject.as_str(), message.payload.clone());
    let mut caught_up = false;

    match message.info() {
        Ok(info) => {
            raw = raw.with_sequence(info.stream_sequence);
            caught_up = info.pending == 0;
        }
        Err(error) => {
            tracing::debug!(
                target: TRACING_TARGET_STREAM,
                error = %error,
                "Message carries no JetStream metadata"
            );
        }
    }

    deliveries.push(Delivery::Message(raw));
    if caught_up {
        deliveries.push(Delivery::EndOfPartition);
    }
}

#[async_trait::async_trait]
impl EventSource for JetStreamEventSource {
    async fn poll(
        &mut self,
        max_messages: usize,
        timeout: Duration,
    ) -> apisync_core::Result<Vec<Delivery>> {
        let mut batch = self
            .consumer
            .batch()
            .max_messages(max_messages)
            .expires(timeout)
            .messages()
            .await
            .map_err(|e| Error::operation("batch_fetch", e.to_string()))?;

        let mut deliveries = Vec::with_capacity(max_messages);
        while let Some(result) = batch.next().await {
            match result {
                Ok(message) => push_message(&mut deliveries, &message),
                Err(error) => {
                    tracing::warn!(
                        target: TRACING_TARGET_STREAM,
                        consumer = %self.consumer_name,
                        error = %error,
                        "Error receiving message in batch"
                    );
                    deliveries.push(Delivery::Error(
                        apisync_core::Error::transport()
                            .with_message(error.to_string())
                            .with_context(self.consumer_name.clone()),
                    ));
                }
            }
        }

        tracing::trace!(
            target: TRACING_TARGET_STREAM,
            consumer = %self.consumer_name,
            deliveries = deliveries.len(),
            requested = max_messages,
            "Fetched batch"
        );

        Ok(deliveries)
    }

    async fn close(&mut self) -> apisync_core::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        self.stream
            .delete_consumer(&self.consumer_name)
            .await
            .map_err(|e| Error::consumer_error(&self.consumer_name, e.to_string()))?;

        tracing::debug!(
            target: TRACING_TARGET_STREAM,
            consumer = %self.consumer_name,
            "Deleted consumer"
        );
        Ok(())
    }
}
