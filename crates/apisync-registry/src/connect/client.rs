//! Reqwest-based HTTP client for the Apicurio Registry.

use std::sync::Arc;

use apisync_core::{ArtifactCoordinate, StoreService};
use reqwest::Client;
use url::Url;

use super::RegistryConfig;
use crate::{Error, Result};

/// Tracing target for registry client operations.
pub const TRACING_TARGET: &str = "apisync_registry::client";

/// Inner client that holds the HTTP client and configuration.
struct RegistryClientInner {
    http: Client,
    base_url: Url,
    config: RegistryConfig,
}

/// HTTP client reading artifact versions from an Apicurio Registry.
///
/// Cheap to clone; clones share the connection pool.
///
/// # Examples
///
/// ```rust,ignore
/// use apisync_registry::{RegistryClient, RegistryConfig};
///
/// let config = RegistryConfig::new("https://registry/apis/registry/v3");
/// let store = RegistryClient::new(config)?.into_service();
/// let version = store.fetch(&coordinate).await?;
/// ```
#[derive(Clone)]
pub struct RegistryClient {
    inner: Arc<RegistryClientInner>,
}

impl std::fmt::Debug for RegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl RegistryClient {
    /// Creates a new registry client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client
    /// cannot be created.
    pub fn new(config: RegistryConfig) -> Result<Self> {
        let base_url = config.base_url()?;
        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET,
            base_url = %base_url,
            timeout_ms = timeout.as_millis(),
            "Creating registry client"
        );

        if config.registry_insecure {
            tracing::warn!(
                target: TRACING_TARGET,
                base_url = %base_url,
                "TLS certificate verification is disabled for the registry"
            );
        }

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(&user_agent)
            .danger_accept_invalid_certs(config.registry_insecure)
            .build()?;

        let inner = RegistryClientInner {
            http,
            base_url,
            config,
        };

        tracing::info!(
            target: TRACING_TARGET,
            "Registry client created successfully"
        );

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Gets the underlying HTTP client.
    pub(crate) fn http(&self) -> &Client {
        &self.inner.http
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    /// Converts this client into a [`StoreService`] for use with dependency injection.
    pub fn into_service(self) -> StoreService {
        StoreService::new(self)
    }

    /// Returns the URL of the raw document of a version.
    pub fn content_url(&self, coordinate: &ArtifactCoordinate) -> apisync_core::Result<Url> {
        self.version_url(coordinate, "content")
    }

    /// Returns the URL of the lifecycle state of a version.
    pub fn state_url(&self, coordinate: &ArtifactCoordinate) -> apisync_core::Result<Url> {
        self.version_url(coordinate, "state")
    }

    /// Appends `groups/{g}/artifacts/{a}/versions/{v}/{leaf}` to the base URL.
    ///
    /// Segments are percent-encoded individually, so identifiers can never
    /// escape their position in the path.
    fn version_url(
        &self,
        coordinate: &ArtifactCoordinate,
        leaf: &str,
    ) -> apisync_core::Result<Url> {
        let version = coordinate.require_version()?;
        let mut url = self.inner.base_url.clone();

        url.path_segments_mut()
            .map_err(|()| Error::InvalidConfig("registry URL cannot be a base".into()))?
            .pop_if_empty()
            .extend([
                "groups",
                coordinate.group(),
                "artifacts",
                coordinate.artifact_id(),
                "versions",
                version,
                leaf,
            ]);

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> RegistryClient {
        RegistryClient::new(RegistryConfig::new(base)).unwrap()
    }

    #[test]
    fn test_content_url() {
        let client = client("https://registry.example.com/apis/registry/v3");
        let coordinate = ArtifactCoordinate::version("shop", "orders-api", "1").unwrap();
        assert_eq!(
            client.content_url(&coordinate).unwrap().as_str(),
            "https://registry.example.com/apis/registry/v3/groups/shop/artifacts/orders-api/versions/1/content"
        );
    }

    #[test]
    fn test_state_url_with_trailing_slash_base() {
        let client = client("https://registry.example.com/apis/registry/v3/");
        let coordinate = ArtifactCoordinate::version("default", "petstore", "2.1").unwrap();
        assert_eq!(
            client.state_url(&coordinate).unwrap().as_str(),
            "https://registry.example.com/apis/registry/v3/groups/default/artifacts/petstore/versions/2.1/state"
        );
    }

    #[test]
    fn test_segments_are_encoded() {
        let client = client("http://localhost:8080/apis/registry/v3");
        let coordinate = ArtifactCoordinate::version("my group", "api?x=1", "1#a").unwrap();
        let url = client.content_url(&coordinate).unwrap();
        assert_eq!(
            url.path(),
            "/apis/registry/v3/groups/my%20group/artifacts/api%3Fx=1/versions/1%23a/content"
        );
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_artifact_level_coordinate_is_rejected() {
        let client = client("http://localhost:8080/apis/registry/v3");
        let coordinate = ArtifactCoordinate::artifact("shop", "orders-api").unwrap();
        assert!(client.content_url(&coordinate).is_err());
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(RegistryClient::new(RegistryConfig::new("not a url")).is_err());
    }

    #[test]
    fn test_insecure_client_builds() {
        let config = RegistryConfig::new("https://localhost:8443").with_insecure(true);
        let client = RegistryClient::new(config).unwrap();
        assert!(client.config().registry_insecure);
    }
}
