//! Artifact store implementation.
//!
//! This module implements the [`ArtifactStore`] trait for [`RegistryClient`].

use apisync_core::{ArtifactCoordinate, ArtifactStore, ArtifactVersion, VersionState};
use serde::Deserialize;

use crate::connect::{RegistryClient, TRACING_TARGET};
use crate::error::Error;

/// Body of the version state endpoint.
#[derive(Debug, Deserialize)]
struct VersionStateResponse {
    state: VersionState,
}

#[async_trait::async_trait]
impl ArtifactStore for RegistryClient {
    async fn fetch(
        &self,
        coordinate: &ArtifactCoordinate,
    ) -> apisync_core::Result<ArtifactVersion> {
        let content_url = self.content_url(coordinate)?;
        let state_url = self.state_url(coordinate)?;

        tracing::debug!(
            target: TRACING_TARGET,
            url = %content_url,
            "Fetching artifact content"
        );

        let content = self
            .http()
            .get(content_url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(Error::from)?
            .bytes()
            .await
            .map_err(Error::from)?;

        let response: VersionStateResponse = self
            .http()
            .get(state_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(Error::from)?
            .json()
            .await
            .map_err(Error::from)?;

        tracing::debug!(
            target: TRACING_TARGET,
            coordinate = %coordinate,
            state = %response.state,
            content_bytes = content.len(),
            "Fetched artifact version"
        );

        Ok(ArtifactVersion::new(content, response.state))
    }
}
