//! In-memory collaborator implementations for testing.
//!
//! Every mock is cheaply cloneable and shares its state between clones, so a
//! test can hand one clone to the code under test and inspect the other.
//!
//! # Feature Flag
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! apisync-core = { version = "...", features = ["test-utils"] }
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use bytes::Bytes;

use crate::{
    ArtifactCoordinate, ArtifactStore, ArtifactVersion, Delivery, Error, EventSource,
    GenerationMode, PolicyGenerator, Result, SyncOutcome, Synchronizer, VersionState,
};

/// One scripted answer of [`MockEventSource::poll`].
#[derive(Debug)]
enum MockPoll {
    Batch(Vec<Delivery>),
    Failure,
}

#[derive(Debug, Default)]
struct MockSourceState {
    script: Mutex<VecDeque<MockPoll>>,
    polls: AtomicUsize,
    closes: AtomicUsize,
}

/// Scripted event source.
///
/// Answers each poll with the next scripted batch and with empty batches
/// once the script is exhausted.
#[derive(Debug, Clone, Default)]
pub struct MockEventSource {
    state: Arc<MockSourceState>,
}

impl MockEventSource {
    /// Creates a source with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a batch to the script.
    #[must_use]
    pub fn with_batch(self, batch: Vec<Delivery>) -> Self {
        self.push(MockPoll::Batch(batch));
        self
    }

    /// Appends an empty poll to the script.
    #[must_use]
    pub fn with_empty_poll(self) -> Self {
        self.with_batch(Vec::new())
    }

    /// Appends a failing poll to the script.
    #[must_use]
    pub fn with_failed_poll(self) -> Self {
        self.push(MockPoll::Failure);
        self
    }

    /// Returns how many times the source was polled.
    pub fn polls(&self) -> usize {
        self.state.polls.load(Ordering::SeqCst)
    }

    /// Returns how many times the source was closed.
    pub fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }

    fn push(&self, poll: MockPoll) {
        self.state
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(poll);
    }
}

#[async_trait::async_trait]
impl EventSource for MockEventSource {
    async fn poll(&mut self, max_messages: usize, _timeout: Duration) -> Result<Vec<Delivery>> {
        self.state.polls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .state
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match next {
            Some(MockPoll::Batch(mut batch)) => {
                batch.truncate(max_messages);
                Ok(batch)
            }
            Some(MockPoll::Failure) => {
                Err(Error::transport().with_message("mock poll failure"))
            }
            None => Ok(Vec::new()),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MockStoreState {
    versions: Mutex<HashMap<String, ArtifactVersion>>,
    fetches: AtomicUsize,
}

/// In-memory artifact registry.
///
/// Fetching a coordinate that was never registered fails with a
/// [`Fetch`](crate::ErrorKind::Fetch) error.
#[derive(Debug, Clone, Default)]
pub struct MockArtifactStore {
    state: Arc<MockStoreState>,
}

impl MockArtifactStore {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers content and state for a version-level coordinate.
    #[must_use]
    pub fn with_version(
        self,
        coordinate: &ArtifactCoordinate,
        content: impl Into<Bytes>,
        state: VersionState,
    ) -> Self {
        self.state
            .versions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(coordinate.to_string(), ArtifactVersion::new(content, state));
        self
    }

    /// Returns how many fetches were made.
    pub fn fetches(&self) -> usize {
        self.state.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ArtifactStore for MockArtifactStore {
    async fn fetch(&self, coordinate: &ArtifactCoordinate) -> Result<ArtifactVersion> {
        self.state.fetches.fetch_add(1, Ordering::SeqCst);
        self.state
            .versions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&coordinate.to_string())
            .cloned()
            .ok_or_else(|| {
                Error::fetch()
                    .with_message("artifact version not found")
                    .with_context(coordinate.to_string())
            })
    }
}

#[derive(Debug, Default)]
struct MockGeneratorState {
    failing: Mutex<HashSet<GenerationMode>>,
    calls: Mutex<Vec<GenerationMode>>,
}

/// Deterministic policy generator.
///
/// Emits a small YAML resource per mode, including a `status` block the
/// output tree is expected to strip. Modes marked with
/// [`MockGenerator::failing`] return a generation error instead.
#[derive(Debug, Clone, Default)]
pub struct MockGenerator {
    state: Arc<MockGeneratorState>,
}

impl MockGenerator {
    /// Creates a generator where every mode succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the given mode fail.
    #[must_use]
    pub fn failing(self, mode: GenerationMode) -> Self {
        self.state
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(mode);
        self
    }

    /// Returns the modes requested so far, in call order.
    pub fn calls(&self) -> Vec<GenerationMode> {
        self.state
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait::async_trait]
impl PolicyGenerator for MockGenerator {
    async fn generate(&self, document: &[u8], mode: GenerationMode) -> Result<Bytes> {
        self.state
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(mode);

        let fails = self
            .state
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&mode);
        if fails {
            return Err(Error::generation()
                .with_message(format!("mock generator failure for {mode}")));
        }

        let kind = match mode {
            GenerationMode::HttpRoute => "HTTPRoute",
            GenerationMode::AuthPolicy => "AuthPolicy",
            GenerationMode::RateLimitPolicy => "RateLimitPolicy",
        };
        let output = format!(
            "apiVersion: kuadrant.io/v1\nkind: {kind}\nspec:\n  sourceBytes: {}\nstatus:\n  conditions: []\n",
            document.len()
        );
        Ok(Bytes::from(output))
    }
}

#[derive(Debug, Default)]
struct MockSyncState {
    roots: Mutex<Vec<PathBuf>>,
    fail: std::sync::atomic::AtomicBool,
}

/// Recording synchronizer.
#[derive(Debug, Clone, Default)]
pub struct MockSynchronizer {
    state: Arc<MockSyncState>,
}

impl MockSynchronizer {
    /// Creates a synchronizer that always succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every synchronization fail.
    #[must_use]
    pub fn failing(self) -> Self {
        self.state.fail.store(true, Ordering::SeqCst);
        self
    }

    /// Returns how many times synchronization was requested.
    pub fn calls(&self) -> usize {
        self.roots().len()
    }

    /// Returns every root synchronization was requested for.
    pub fn roots(&self) -> Vec<PathBuf> {
        self.state
            .roots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait::async_trait]
impl Synchronizer for MockSynchronizer {
    async fn synchronize(&self, root: &Path) -> Result<SyncOutcome> {
        self.state
            .roots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(root.to_path_buf());

        if self.state.fail.load(Ordering::SeqCst) {
            return Err(Error::sync().with_message("mock push rejected"));
        }
        Ok(SyncOutcome::Pushed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, PolicyDocument, RawMessage};

    #[tokio::test]
    async fn test_source_follows_script_then_idles() {
        let source = MockEventSource::new()
            .with_batch(vec![Delivery::Message(RawMessage::new("events", "{}"))])
            .with_failed_poll();
        let mut polled = source.clone();

        let first = polled.poll(10, Duration::from_secs(5)).await.unwrap();
        assert_eq!(first.len(), 1);
        assert!(polled.poll(10, Duration::from_secs(5)).await.is_err());
        assert!(polled.poll(10, Duration::from_secs(5)).await.unwrap().is_empty());

        polled.close().await.unwrap();
        assert_eq!(source.polls(), 3);
        assert_eq!(source.closes(), 1);
    }

    #[tokio::test]
    async fn test_store_unknown_version_fails() {
        let coordinate = ArtifactCoordinate::version("shop", "orders-api", "1").unwrap();
        let store = MockArtifactStore::new();
        let error = store.fetch(&coordinate).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Fetch);
        assert_eq!(store.fetches(), 1);
    }

    #[tokio::test]
    async fn test_generator_output_parses() {
        let generator = MockGenerator::new().failing(GenerationMode::AuthPolicy);

        let output = generator
            .generate(b"openapi: 3.0.0", GenerationMode::HttpRoute)
            .await
            .unwrap();
        let document = PolicyDocument::parse(&output).unwrap();
        assert_eq!(document.kind(), Some("HTTPRoute"));
        assert!(document.has_status());

        assert!(
            generator
                .generate(b"openapi: 3.0.0", GenerationMode::AuthPolicy)
                .await
                .is_err()
        );
        assert_eq!(
            generator.calls(),
            vec![GenerationMode::HttpRoute, GenerationMode::AuthPolicy]
        );
    }
}
