//! Artifact registry abstraction.

mod service;

use bytes::Bytes;
pub use service::StoreService;

use crate::{ArtifactCoordinate, Result, VersionState};

/// Content and current state of one artifact version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactVersion {
    /// Raw artifact content, typically an OpenAPI document.
    pub content: Bytes,
    /// State reported by the registry at fetch time.
    pub state: VersionState,
}

impl ArtifactVersion {
    /// Creates a new artifact version.
    pub fn new(content: impl Into<Bytes>, state: VersionState) -> Self {
        Self {
            content: content.into(),
            state,
        }
    }
}

/// Core trait for reading artifacts from a registry.
///
/// Implement this trait to plug in another registry or an in-memory fake.
#[async_trait::async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Fetches content and state of a version-level coordinate.
    ///
    /// # Errors
    ///
    /// Returns a [`Fetch`](crate::ErrorKind::Fetch) error when the registry
    /// is unreachable or the version does not exist.
    async fn fetch(&self, coordinate: &ArtifactCoordinate) -> Result<ArtifactVersion>;
}
