//! Policy generator abstraction.

mod service;

use bytes::Bytes;
pub use service::GeneratorService;

use crate::{GenerationMode, Result};

/// Core trait for deriving a policy document from an API specification.
///
/// Implementations may shell out to a CLI, call a library in-process or hit
/// a remote service; the dispatcher only sees bytes in and bytes out.
#[async_trait::async_trait]
pub trait PolicyGenerator: Send + Sync {
    /// Generates the document for one mode.
    ///
    /// # Errors
    ///
    /// Returns a [`Generation`](crate::ErrorKind::Generation) error when the
    /// generator fails for this mode.
    async fn generate(&self, document: &[u8], mode: GenerationMode) -> Result<Bytes>;
}
