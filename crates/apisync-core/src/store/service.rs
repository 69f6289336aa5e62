//! Artifact store wrapper with observability.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use super::{ArtifactStore, ArtifactVersion};
use crate::{ArtifactCoordinate, Result, TRACING_TARGET_STORE};

/// Artifact store wrapper with observability.
///
/// This wrapper adds structured logging to any [`ArtifactStore`]
/// implementation. The inner store is wrapped in `Arc` for cheap cloning.
#[derive(Clone)]
pub struct StoreService {
    inner: Arc<dyn ArtifactStore>,
}

impl fmt::Debug for StoreService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreService").finish_non_exhaustive()
    }
}

impl StoreService {
    /// Create a new store service wrapper.
    pub fn new<S>(store: S) -> Self
    where
        S: ArtifactStore + 'static,
    {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Fetches content and state of an artifact version.
    pub async fn fetch(&self, coordinate: &ArtifactCoordinate) -> Result<ArtifactVersion> {
        let started_at = Instant::now();

        tracing::debug!(
            target: TRACING_TARGET_STORE,
            coordinate = %coordinate,
            "Fetching artifact version"
        );

        let result = self.inner.fetch(coordinate).await;
        let elapsed = started_at.elapsed();

        match &result {
            Ok(version) => {
                tracing::debug!(
                    target: TRACING_TARGET_STORE,
                    coordinate = %coordinate,
                    state = %version.state,
                    content_bytes = version.content.len(),
                    elapsed_ms = elapsed.as_millis(),
                    "Fetched artifact version"
                );
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET_STORE,
                    coordinate = %coordinate,
                    error = %error,
                    elapsed_ms = elapsed.as_millis(),
                    "Failed to fetch artifact version"
                );
            }
        }

        result
    }
}
