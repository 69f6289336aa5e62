//! Configuration for the registry client.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Default timeout for HTTP requests: 30 seconds.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the Apicurio Registry client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct RegistryConfig {
    /// Registry API base URL, e.g. `https://registry/apis/registry/v3`
    #[cfg_attr(feature = "config", arg(long = "registry-url", env = "REGISTRY_URL"))]
    pub registry_url: String,

    /// Timeout for registry requests in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "http-timeout", env = "HTTP_TIMEOUT_SECS", default_value_t = default_http_timeout())
    )]
    #[serde(default = "default_http_timeout")]
    pub http_timeout: u64,

    /// Skip TLS certificate verification for the registry
    #[cfg_attr(
        feature = "config",
        arg(long = "registry-insecure", env = "REGISTRY_INSECURE", default_value_t = false)
    )]
    #[serde(default)]
    pub registry_insecure: bool,

    /// User-Agent header sent with registry requests
    #[cfg_attr(
        feature = "config",
        arg(long = "registry-user-agent", env = "REGISTRY_USER_AGENT")
    )]
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_http_timeout() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

impl RegistryConfig {
    /// Creates a configuration for the given base URL.
    pub fn new(registry_url: impl Into<String>) -> Self {
        Self {
            registry_url: registry_url.into(),
            http_timeout: default_http_timeout(),
            registry_insecure: false,
            user_agent: None,
        }
    }

    /// Returns the default user agent string.
    fn default_user_agent() -> String {
        format!("apisync/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Sets the request timeout in seconds.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.http_timeout = secs;
        self
    }

    /// Disables TLS certificate verification.
    #[must_use]
    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.registry_insecure = insecure;
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Returns the effective timeout, using default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.http_timeout == 0 {
            DEFAULT_TIMEOUT
        } else {
            Duration::from_secs(self.http_timeout)
        }
    }

    /// Returns the effective user agent, using default if empty.
    pub fn effective_user_agent(&self) -> String {
        match self.user_agent.as_deref() {
            Some(agent) if !agent.is_empty() => agent.to_owned(),
            _ => Self::default_user_agent(),
        }
    }

    /// Parses the base URL.
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(self.registry_url.trim())?;
        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(Error::InvalidConfig(format!(
                    "unsupported registry URL scheme: {scheme}"
                )));
            }
        }
        if url.cannot_be_a_base() {
            return Err(Error::InvalidConfig(format!(
                "registry URL cannot be a base: {url}"
            )));
        }
        Ok(url)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        self.base_url().map(|_| ())
    }
}
