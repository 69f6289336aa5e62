//! Version-control synchronization abstraction.

mod service;

use std::path::Path;

pub use service::SyncService;

use crate::Result;

/// Commit message used for every synchronization.
pub const COMMIT_MESSAGE: &str = "Update Kuadrant resources";

/// Result of a successful synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nothing changed since the last revision.
    NoChanges,
    /// A new revision was recorded locally but not pushed.
    Committed,
    /// A new revision was recorded and pushed upstream.
    Pushed,
}

/// Core trait for persisting a directory as a new upstream revision.
#[async_trait::async_trait]
pub trait Synchronizer: Send + Sync {
    /// Persists the current contents of `root`.
    ///
    /// # Errors
    ///
    /// Returns a [`Sync`](crate::ErrorKind::Sync) error when staging,
    /// committing or pushing fails.
    async fn synchronize(&self, root: &Path) -> Result<SyncOutcome>;
}
