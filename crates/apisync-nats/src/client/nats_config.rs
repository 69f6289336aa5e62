//! NATS connection and subscription configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Configuration for the NATS connection and the events subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct NatsConfig {
    /// NATS server URL (comma-separated for clustering)
    #[cfg_attr(feature = "config", arg(long = "nats-url", env = "NATS_URL"))]
    pub nats_url: String,

    /// Authentication token (optional)
    #[cfg_attr(feature = "config", arg(long = "nats-token", env = "NATS_TOKEN"))]
    pub nats_token: Option<String>,

    /// Connection timeout in seconds (optional)
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-connect-timeout", env = "NATS_CONNECT_TIMEOUT_SECS")
    )]
    pub nats_connect_timeout: Option<u64>,

    /// Subject the registry publishes lifecycle events on
    #[cfg_attr(feature = "config", arg(long = "topic", env = "EVENTS_TOPIC"))]
    pub topic: String,

    /// Consumer identity, freshly generated for every process start
    #[cfg_attr(feature = "config", arg(skip = generate_consumer_name()))]
    #[serde(default = "generate_consumer_name")]
    pub consumer_name: String,
}

// Default values
const DEFAULT_CLIENT_NAME: &str = "apisync";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PING_INTERVAL_SECS: u64 = 30;
const CONSUMER_PREFIX: &str = "apisync";
const SUPPORTED_SCHEMES: [&str; 4] = ["nats://", "tls://", "ws://", "wss://"];

/// Generates a unique consumer name so every run replays the stream.
fn generate_consumer_name() -> String {
    format!("{CONSUMER_PREFIX}-{}", uuid::Uuid::new_v4().simple())
}

impl NatsConfig {
    /// Create a new configuration with a server URL and a topic.
    pub fn new(server_url: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            nats_url: server_url.into(),
            nats_token: None,
            nats_connect_timeout: None,
            topic: topic.into(),
            consumer_name: generate_consumer_name(),
        }
    }

    /// Returns the client connection name.
    #[inline]
    pub fn name(&self) -> &str {
        DEFAULT_CLIENT_NAME
    }

    /// Returns the server URLs as a vector (splits comma-separated URLs).
    pub(crate) fn servers(&self) -> Vec<&str> {
        self.nats_url.split(',').map(str::trim).collect()
    }

    /// Returns the connection timeout, falling back to the default.
    #[inline]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(
            self.nats_connect_timeout
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        )
    }

    /// Returns the ping interval as a Duration.
    #[inline]
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(DEFAULT_PING_INTERVAL_SECS)
    }

    /// Set server URL(s).
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.nats_url = url.into();
        self
    }

    /// Set the authentication token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.nats_token = Some(token.into());
        self
    }

    /// Set the connection timeout in seconds.
    #[must_use]
    pub fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.nats_connect_timeout = Some(secs);
        self
    }

    /// Set the consumer name.
    #[must_use]
    pub fn with_consumer_name(mut self, name: impl Into<String>) -> Self {
        self.consumer_name = name.into();
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        for server in self.servers() {
            if server.is_empty() {
                return Err(Error::invalid_config("Server URL cannot be empty"));
            }
            if !SUPPORTED_SCHEMES.iter().any(|s| server.starts_with(s)) {
                return Err(Error::invalid_config(format!(
                    "Invalid server URL format: {server}"
                )));
            }
        }

        if self.topic.trim().is_empty() {
            return Err(Error::invalid_config("Topic cannot be empty"));
        }
        if self.topic.chars().any(char::is_whitespace) {
            return Err(Error::invalid_config(format!(
                "Topic cannot contain whitespace: {:?}",
                self.topic
            )));
        }

        if self.nats_token.as_deref().is_some_and(str::is_empty) {
            return Err(Error::invalid_config("Token cannot be empty when set"));
        }

        if self.nats_connect_timeout == Some(0) {
            return Err(Error::invalid_config(
                "Connect timeout must be at least one second",
            ));
        }

        Ok(())
    }
}
