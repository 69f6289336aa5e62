//! Single-threaded batch consumption loop.

use apisync_core::{Delivery, EventSource, LifecycleEvent, RawMessage, SyncService};
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use super::{IdleClock, LoopSettings, RunOutcome, RunStats, RunSummary};
use crate::dispatch::EventDispatcher;

/// Tracing target for the consumption loop.
const TRACING_TARGET: &str = "apisync_worker::consumer";

/// Polls a stream in batches and dispatches each event in order.
///
/// Each empty poll counts its full timeout towards the idle clock and any
/// non-empty batch resets it. A failed poll does neither; the loop waits
/// out the poll timeout and polls again. Once the clock reaches the idle threshold the
/// output tree is synchronized exactly once and the run ends. A cancelled
/// token ends the run without synchronizing. The source is closed exactly
/// once on both paths.
pub struct ConsumptionLoop<S> {
    source: S,
    dispatcher: EventDispatcher,
    synchronizer: SyncService,
    settings: LoopSettings,
    cancel_token: CancellationToken,
}

impl<S: EventSource> ConsumptionLoop<S> {
    /// Creates a new loop over `source`.
    pub fn new(
        source: S,
        dispatcher: EventDispatcher,
        synchronizer: SyncService,
        settings: LoopSettings,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            source,
            dispatcher,
            synchronizer,
            settings,
            cancel_token,
        }
    }

    /// Runs until the stream goes idle or the token is cancelled.
    pub async fn run(mut self) -> RunSummary {
        tracing::info!(
            target: TRACING_TARGET,
            batch_size = self.settings.batch_size(),
            poll_timeout_secs = self.settings.poll_timeout().as_secs(),
            idle_threshold_secs = self.settings.idle_threshold().as_secs(),
            root = %self.dispatcher.tree().root().display(),
            "Starting consumption loop"
        );

        let mut stats = RunStats::default();
        let outcome = self.consume(&mut stats).await;

        if let Err(error) = self.source.close().await {
            tracing::warn!(
                target: TRACING_TARGET,
                error = %error,
                "Failed to close event source"
            );
        }

        tracing::info!(
            target: TRACING_TARGET,
            outcome = %outcome,
            polls = stats.polls,
            messages = stats.messages,
            dispatched = stats.dispatched,
            generated = stats.generated,
            deleted = stats.deleted,
            ignored = stats.ignored,
            skipped = stats.skipped,
            failed = stats.failed,
            "Consumption loop finished"
        );

        RunSummary { outcome, stats }
    }

    async fn consume(&mut self, stats: &mut RunStats) -> RunOutcome {
        let mut clock = IdleClock::new(self.settings.idle_threshold());
        let batch_size = self.settings.batch_size();
        let poll_timeout = self.settings.poll_timeout();

        loop {
            let started = Instant::now();
            let polled = tokio::select! {
                biased;

                () = self.cancel_token.cancelled() => {
                    tracing::info!(
                        target: TRACING_TARGET,
                        "Shutdown requested, stopping consumption"
                    );
                    return RunOutcome::Interrupted;
                }

                polled = self.source.poll(batch_size, poll_timeout) => polled,
            };
            stats.polls += 1;

            let batch = match polled {
                Ok(batch) => batch,
                Err(error) => {
                    stats.failed_polls += 1;
                    tracing::warn!(
                        target: TRACING_TARGET,
                        error = %error,
                        idle_secs = clock.elapsed().as_secs(),
                        "Poll failed, retrying after the poll timeout"
                    );
                    // The idle clock is left untouched.
                    tokio::select! {
                        biased;

                        () = self.cancel_token.cancelled() => {
                            tracing::info!(
                                target: TRACING_TARGET,
                                "Shutdown requested, stopping consumption"
                            );
                            return RunOutcome::Interrupted;
                        }

                        () = time::sleep_until(started + poll_timeout) => {}
                    }
                    continue;
                }
            };

            if batch.is_empty() {
                stats.empty_polls += 1;
                let idle = clock.advance(poll_timeout);
                tracing::debug!(
                    target: TRACING_TARGET,
                    idle_secs = clock.elapsed().as_secs(),
                    threshold_secs = clock.threshold().as_secs(),
                    "No messages received"
                );
                if idle {
                    break;
                }
                continue;
            }

            clock.reset();
            tracing::debug!(
                target: TRACING_TARGET,
                deliveries = batch.len(),
                "Received batch"
            );

            for delivery in batch {
                if self.cancel_token.is_cancelled() {
                    tracing::info!(
                        target: TRACING_TARGET,
                        "Shutdown requested, dropping the rest of the batch"
                    );
                    return RunOutcome::Interrupted;
                }
                self.handle_delivery(delivery, stats).await;
            }
        }

        tracing::info!(
            target: TRACING_TARGET,
            idle_secs = clock.elapsed().as_secs(),
            "Stream is idle"
        );

        // The service logs failures; the run still ends.
        let sync = self
            .synchronizer
            .synchronize(self.dispatcher.tree().root())
            .await
            .ok();
        RunOutcome::Idle { sync }
    }

    async fn handle_delivery(&self, delivery: Delivery, stats: &mut RunStats) {
        match delivery {
            Delivery::Message(message) => {
                stats.messages += 1;
                self.handle_message(message, stats).await;
            }
            Delivery::EndOfPartition => {
                stats.end_of_partition += 1;
                tracing::debug!(target: TRACING_TARGET, "Reached end of partition");
            }
            Delivery::Error(error) => {
                stats.skipped += 1;
                tracing::warn!(
                    target: TRACING_TARGET,
                    error = %error,
                    "Skipping undeliverable message"
                );
            }
        }
    }

    async fn handle_message(&self, message: RawMessage, stats: &mut RunStats) {
        let event = match LifecycleEvent::decode(&message.payload) {
            Ok(event) => event,
            Err(error) => {
                stats.skipped += 1;
                tracing::warn!(
                    target: TRACING_TARGET,
                    subject = %message.subject,
                    sequence = ?message.sequence,
                    error = %error,
                    "Skipping undecodable message"
                );
                return;
            }
        };

        let outcome = self.dispatcher.dispatch(&event).await;
        if outcome.is_failure() {
            tracing::warn!(
                target: TRACING_TARGET,
                sequence = ?message.sequence,
                event = %event.kind,
                coordinate = %event.coordinate,
                outcome = ?outcome,
                "Event was not fully applied"
            );
        }
        stats.record(&outcome);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use apisync_core::mock::{MockArtifactStore, MockEventSource, MockGenerator, MockSynchronizer};
    use apisync_core::prelude::*;
    use tempfile::TempDir;

    use super::*;
    use crate::output::OutputTree;

    const OPENAPI: &str = "openapi: 3.0.0\ninfo:\n  title: Orders\n  version: '1'\npaths: {}\n";

    fn orders(version: &str) -> ArtifactCoordinate {
        ArtifactCoordinate::version("shop", "orders-api", version).unwrap()
    }

    fn created(artifact_id: &str, version: &str) -> Delivery {
        let payload = serde_json::json!({
            "eventType": "ARTIFACT_VERSION_CREATED",
            "groupId": "shop",
            "artifactId": artifact_id,
            "version": version,
        });
        let body = serde_json::json!({ "payload": payload.to_string() });
        Delivery::Message(RawMessage::new("registry-events", body.to_string()))
    }

    fn settings() -> LoopSettings {
        LoopSettings::new(10, Duration::from_secs(5), Duration::from_secs(10)).unwrap()
    }

    struct Harness {
        temp: TempDir,
        source: MockEventSource,
        generator: MockGenerator,
        synchronizer: MockSynchronizer,
    }

    impl Harness {
        fn new(source: MockEventSource) -> Self {
            Self {
                temp: TempDir::new().unwrap(),
                source,
                generator: MockGenerator::new(),
                synchronizer: MockSynchronizer::new(),
            }
        }

        fn build(
            &self,
            store: impl ArtifactStore + 'static,
            cancel_token: CancellationToken,
        ) -> ConsumptionLoop<MockEventSource> {
            let dispatcher = EventDispatcher::new(
                StoreService::new(store),
                GeneratorService::new(self.generator.clone()),
                OutputTree::new(self.temp.path()),
            );
            ConsumptionLoop::new(
                self.source.clone(),
                dispatcher,
                SyncService::new(self.synchronizer.clone()),
                settings(),
                cancel_token,
            )
        }

        async fn run(&self, store: MockArtifactStore) -> RunSummary {
            self.build(store, CancellationToken::new()).run().await
        }
    }

    #[tokio::test]
    async fn test_created_event_is_generated_then_synced() {
        let source = MockEventSource::new().with_batch(vec![created("orders-api", "1")]);
        let harness = Harness::new(source);
        let store = MockArtifactStore::new().with_version(&orders("1"), OPENAPI, VersionState::Enabled);

        let summary = harness.run(store).await;

        assert_eq!(
            summary.outcome,
            RunOutcome::Idle {
                sync: Some(SyncOutcome::Pushed)
            }
        );
        assert_eq!(summary.stats.generated, 1);
        assert_eq!(summary.stats.polls, 3);
        assert_eq!(harness.synchronizer.calls(), 1);
        assert_eq!(harness.synchronizer.roots(), vec![harness.temp.path().to_path_buf()]);
        assert_eq!(harness.source.closes(), 1);

        let version_dir = harness.temp.path().join("shop/orders-api/1");
        for mode in GenerationMode::ALL {
            let file = version_dir.join(format!("shop_orders-api_v1_{mode}.yaml"));
            assert!(file.exists(), "missing {}", file.display());
        }
    }

    #[tokio::test]
    async fn test_single_empty_poll_does_not_sync() {
        let source = MockEventSource::new()
            .with_empty_poll()
            .with_batch(vec![created("orders-api", "1")])
            .with_empty_poll()
            .with_batch(vec![created("orders-api", "1")]);
        let harness = Harness::new(source);
        let store = MockArtifactStore::new().with_version(&orders("1"), OPENAPI, VersionState::Enabled);

        let summary = harness.run(store).await;

        // Two scripted empty polls are separated by messages; only the final
        // pair of unscripted empty polls trips the threshold.
        assert_eq!(summary.stats.polls, 6);
        assert_eq!(summary.stats.empty_polls, 4);
        assert_eq!(summary.stats.generated, 2);
        assert_eq!(harness.synchronizer.calls(), 1);
    }

    #[tokio::test]
    async fn test_end_of_partition_resets_idle_clock() {
        let source = MockEventSource::new()
            .with_empty_poll()
            .with_batch(vec![Delivery::EndOfPartition]);
        let harness = Harness::new(source);

        let summary = harness.run(MockArtifactStore::new()).await;

        assert!(summary.is_idle());
        assert_eq!(summary.stats.polls, 4);
        assert_eq!(summary.stats.end_of_partition, 1);
        assert_eq!(summary.stats.dispatched, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_polls_do_not_advance_idle_clock() {
        let source = MockEventSource::new()
            .with_failed_poll()
            .with_failed_poll()
            .with_batch(vec![created("orders-api", "1")]);
        let harness = Harness::new(source);
        let store = MockArtifactStore::new().with_version(&orders("1"), OPENAPI, VersionState::Enabled);

        let started = tokio::time::Instant::now();
        let summary = harness.run(store).await;

        assert!(summary.is_idle());
        assert_eq!(summary.stats.polls, 5);
        assert_eq!(summary.stats.failed_polls, 2);
        assert_eq!(summary.stats.empty_polls, 2);
        assert_eq!(summary.stats.generated, 1);
        assert_eq!(harness.synchronizer.calls(), 1);
        // Each failure waits out one poll timeout before retrying.
        assert!(started.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_during_failure_backoff() {
        let source = MockEventSource::new().with_failed_poll();
        let harness = Harness::new(source);
        let cancel_token = CancellationToken::new();

        let trigger = cancel_token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });
        let summary = harness
            .build(MockArtifactStore::new(), cancel_token)
            .run()
            .await;

        assert_eq!(summary.outcome, RunOutcome::Interrupted);
        assert_eq!(summary.stats.polls, 1);
        assert_eq!(harness.synchronizer.calls(), 0);
        assert_eq!(harness.source.closes(), 1);
    }

    #[tokio::test]
    async fn test_bad_messages_do_not_stop_the_batch() {
        let source = MockEventSource::new().with_batch(vec![
            Delivery::Message(RawMessage::new("registry-events", "not json")),
            Delivery::Error(Error::transport().with_message("broken frame")),
            created("orders-api", "1"),
        ]);
        let harness = Harness::new(source);
        let store = MockArtifactStore::new().with_version(&orders("1"), OPENAPI, VersionState::Enabled);

        let summary = harness.run(store).await;

        assert_eq!(summary.stats.messages, 2);
        assert_eq!(summary.stats.skipped, 2);
        assert_eq!(summary.stats.generated, 1);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_later_events() {
        let source = MockEventSource::new().with_batch(vec![
            created("orders-api", "1"),
            created("missing-api", "1"),
            created("orders-api", "2"),
        ]);
        let mut harness = Harness::new(source);
        harness.generator = MockGenerator::new().failing(GenerationMode::AuthPolicy);
        let store = MockArtifactStore::new()
            .with_version(&orders("1"), OPENAPI, VersionState::Enabled)
            .with_version(&orders("2"), OPENAPI, VersionState::Enabled);

        let summary = harness.run(store).await;

        assert_eq!(summary.stats.dispatched, 3);
        assert_eq!(summary.stats.failed, 3);
        let version_two = harness.temp.path().join("shop/orders-api/2");
        assert!(version_two.join("shop_orders-api_v2_httproute.yaml").exists());
        assert!(!version_two.join("shop_orders-api_v2_authpolicy.yaml").exists());
        assert_eq!(harness.synchronizer.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_sync_still_ends_the_run() {
        let mut harness = Harness::new(MockEventSource::new());
        harness.synchronizer = MockSynchronizer::new().failing();

        let summary = harness.run(MockArtifactStore::new()).await;

        assert_eq!(summary.outcome, RunOutcome::Idle { sync: None });
        assert_eq!(harness.source.closes(), 1);
    }

    #[tokio::test]
    async fn test_interrupt_closes_without_sync() {
        let source = MockEventSource::new().with_batch(vec![created("orders-api", "1")]);
        let harness = Harness::new(source);
        let cancel_token = CancellationToken::new();
        cancel_token.cancel();

        let summary = harness
            .build(MockArtifactStore::new(), cancel_token)
            .run()
            .await;

        assert_eq!(summary.outcome, RunOutcome::Interrupted);
        assert_eq!(summary.stats.polls, 0);
        assert_eq!(harness.synchronizer.calls(), 0);
        assert_eq!(harness.source.closes(), 1);
    }

    /// Registry that requests shutdown while serving its first fetch.
    struct CancellingStore {
        inner: MockArtifactStore,
        cancel_token: CancellationToken,
    }

    #[async_trait::async_trait]
    impl ArtifactStore for CancellingStore {
        async fn fetch(&self, coordinate: &ArtifactCoordinate) -> Result<ArtifactVersion> {
            self.cancel_token.cancel();
            self.inner.fetch(coordinate).await
        }
    }

    #[tokio::test]
    async fn test_interrupt_mid_batch_finishes_current_event_only() {
        let source = MockEventSource::new().with_batch(vec![
            created("orders-api", "1"),
            created("orders-api", "2"),
            created("orders-api", "3"),
        ]);
        let harness = Harness::new(source);
        let cancel_token = CancellationToken::new();
        let inner = MockArtifactStore::new()
            .with_version(&orders("1"), OPENAPI, VersionState::Enabled)
            .with_version(&orders("2"), OPENAPI, VersionState::Enabled)
            .with_version(&orders("3"), OPENAPI, VersionState::Enabled);
        let store = CancellingStore {
            inner: inner.clone(),
            cancel_token: cancel_token.clone(),
        };

        let summary = harness.build(store, cancel_token).run().await;

        assert_eq!(summary.outcome, RunOutcome::Interrupted);
        assert_eq!(summary.stats.polls, 1);
        assert_eq!(summary.stats.dispatched, 1);
        assert_eq!(summary.stats.generated, 1);
        assert_eq!(inner.fetches(), 1);
        assert!(harness.temp.path().join("shop/orders-api/1").exists());
        assert!(!harness.temp.path().join("shop/orders-api/2").exists());
        assert_eq!(harness.synchronizer.calls(), 0);
        assert_eq!(harness.source.closes(), 1);
    }
}
