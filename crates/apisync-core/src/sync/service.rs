//! Synchronizer wrapper with observability.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use super::{SyncOutcome, Synchronizer};
use crate::{Result, TRACING_TARGET_SYNC};

/// Synchronizer wrapper with observability.
#[derive(Clone)]
pub struct SyncService {
    inner: Arc<dyn Synchronizer>,
}

impl fmt::Debug for SyncService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncService").finish_non_exhaustive()
    }
}

impl SyncService {
    /// Create a new sync service wrapper.
    pub fn new<S>(synchronizer: S) -> Self
    where
        S: Synchronizer + 'static,
    {
        Self {
            inner: Arc::new(synchronizer),
        }
    }

    /// Persists the current contents of `root` upstream.
    pub async fn synchronize(&self, root: &Path) -> Result<SyncOutcome> {
        let started_at = Instant::now();

        tracing::info!(
            target: TRACING_TARGET_SYNC,
            root = %root.display(),
            "Synchronizing output tree"
        );

        let result = self.inner.synchronize(root).await;
        let elapsed = started_at.elapsed();

        match &result {
            Ok(outcome) => {
                tracing::info!(
                    target: TRACING_TARGET_SYNC,
                    outcome = ?outcome,
                    elapsed_ms = elapsed.as_millis(),
                    "Output tree synchronized"
                );
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET_SYNC,
                    error = %error,
                    context = ?error.context,
                    elapsed_ms = elapsed.as_millis(),
                    "Output tree synchronization failed"
                );
            }
        }

        result
    }
}
