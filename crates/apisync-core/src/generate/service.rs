//! Policy generator wrapper with observability.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use super::PolicyGenerator;
use crate::{GenerationMode, PolicyDocument, Result, TRACING_TARGET_GENERATE};

/// Policy generator wrapper with observability.
///
/// Besides logging, the wrapper parses the raw generator output so callers
/// always receive a structured [`PolicyDocument`].
#[derive(Clone)]
pub struct GeneratorService {
    inner: Arc<dyn PolicyGenerator>,
}

impl fmt::Debug for GeneratorService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorService").finish_non_exhaustive()
    }
}

impl GeneratorService {
    /// Create a new generator service wrapper.
    pub fn new<G>(generator: G) -> Self
    where
        G: PolicyGenerator + 'static,
    {
        Self {
            inner: Arc::new(generator),
        }
    }

    /// Generates and parses the document for one mode.
    pub async fn generate(&self, document: &[u8], mode: GenerationMode) -> Result<PolicyDocument> {
        let started_at = Instant::now();

        tracing::debug!(
            target: TRACING_TARGET_GENERATE,
            mode = %mode,
            input_bytes = document.len(),
            "Generating policy document"
        );

        let result = self
            .inner
            .generate(document, mode)
            .await
            .and_then(|output| PolicyDocument::parse(&output));
        let elapsed = started_at.elapsed();

        match &result {
            Ok(policy) => {
                tracing::debug!(
                    target: TRACING_TARGET_GENERATE,
                    mode = %mode,
                    kind = ?policy.kind(),
                    elapsed_ms = elapsed.as_millis(),
                    "Generated policy document"
                );
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET_GENERATE,
                    mode = %mode,
                    error = %error,
                    elapsed_ms = elapsed.as_millis(),
                    "Policy generation failed"
                );
            }
        }

        result
    }
}
