//! NATS client wrapper and connection management.

use std::sync::Arc;
use std::time::Duration;

use async_nats::{ConnectOptions, jetstream};
use tokio::time::timeout;

use super::nats_config::NatsConfig;
use crate::stream::JetStreamEventSource;
use crate::{Error, Result, TRACING_TARGET_CLIENT, TRACING_TARGET_CONNECTION};

/// NATS client wrapper with connection management.
///
/// This wrapper is cheaply cloneable and thread-safe.
#[derive(Debug, Clone)]
pub struct NatsClient {
    inner: Arc<NatsClientInner>,
}

/// Inner data for NATS client
#[derive(Debug)]
struct NatsClientInner {
    jetstream: jetstream::Context,
    config: NatsConfig,
}

impl NatsClient {
    /// Create a new NATS client and connect.
    ///
    /// TLS certificate verification is always left enabled.
    #[tracing::instrument(skip(config), target = TRACING_TARGET_CONNECTION)]
    pub async fn connect(config: NatsConfig) -> Result<Self> {
        config.validate()?;

        tracing::info!(
            target: TRACING_TARGET_CONNECTION,
            servers = ?config.servers(),
            "Connecting to NATS servers"
        );

        let mut connect_opts = ConnectOptions::new()
            .name(config.name())
            .ping_interval(config.ping_interval())
            .connection_timeout(config.connect_timeout());

        if let Some(token) = config.nats_token.clone() {
            connect_opts = connect_opts.token(token);
        }

        let connect_timeout = config.connect_timeout();
        let client = timeout(
            connect_timeout,
            async_nats::connect_with_options(config.nats_url.as_str(), connect_opts),
        )
        .await
        .map_err(|_| Error::Timeout {
            timeout: connect_timeout,
        })?
        .map_err(|e| Error::Connection(Box::new(e)))?;

        let server_info = client.server_info();
        tracing::info!(
            target: TRACING_TARGET_CONNECTION,
            server_host = %server_info.host,
            server_version = %server_info.version,
            server_id = %server_info.server_id,
            "Successfully connected to NATS"
        );

        Ok(Self {
            inner: Arc::new(NatsClientInner {
                jetstream: jetstream::new(client),
                config,
            }),
        })
    }

    /// Subscribes to the configured topic from the earliest retained message.
    ///
    /// Resolves the stream that captures the topic and creates an ephemeral
    /// pull consumer named after [`NatsConfig::consumer_name`]. The consumer
    /// does not track acknowledgements, so replaying is the only way to see
    /// events again.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_CLIENT)]
    pub async fn subscribe(&self) -> Result<JetStreamEventSource> {
        let config = &self.inner.config;
        let topic = config.topic.as_str();
        let consumer_name = config.consumer_name.as_str();

        let stream_name = self
            .inner
            .jetstream
            .stream_by_subject(topic)
            .await
            .map_err(|e| Error::stream_error(topic, e.to_string()))?;

        let stream = self
            .inner
            .jetstream
            .get_stream(&stream_name)
            .await
            .map_err(|e| Error::stream_error(&stream_name, e.to_string()))?;

        let consumer_config = jetstream::consumer::pull::Config {
            name: Some(consumer_name.to_owned()),
            description: Some(format!("apisync replay of {topic}")),
            deliver_policy: jetstream::consumer::DeliverPolicy::All,
            ack_policy: jetstream::consumer::AckPolicy::None,
            filter_subject: topic.to_owned(),
            inactive_threshold: INACTIVE_THRESHOLD,
            ..Default::default()
        };

        let consumer = stream
            .create_consumer(consumer_config)
            .await
            .map_err(|e| Error::consumer_error(consumer_name, e.to_string()))?;

        tracing::info!(
            target: TRACING_TARGET_CLIENT,
            stream = %stream_name,
            topic = %topic,
            consumer = %consumer_name,
            "Subscribed to events topic"
        );

        Ok(JetStreamEventSource::new(
            stream,
            consumer,
            consumer_name.to_owned(),
        ))
    }
}

/// Lets the server reap consumers of processes that died before closing.
const INACTIVE_THRESHOLD: Duration = Duration::from_secs(300);
