use apisync_core::{
    ArtifactCoordinate, EventKind, GenerationMode, GeneratorService, LifecycleEvent,
    StoreService,
};

use super::{DispatchOutcome, GenerationReport};
use crate::output::OutputTree;

/// Tracing target for event dispatch.
const TRACING_TARGET: &str = "apisync_worker::dispatch";

/// Turns decoded lifecycle events into side effects on the output tree.
///
/// Every failure is logged and folded into the returned
/// [`DispatchOutcome`]; dispatching never aborts the run.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    store: StoreService,
    generator: GeneratorService,
    tree: OutputTree,
    prune_on_disable: bool,
}

impl EventDispatcher {
    /// Creates a dispatcher writing into `tree`.
    pub fn new(store: StoreService, generator: GeneratorService, tree: OutputTree) -> Self {
        Self {
            store,
            generator,
            tree,
            prune_on_disable: false,
        }
    }

    /// Deletes a version's policies when it moves to a non-enabled state.
    #[must_use]
    pub fn with_prune_on_disable(mut self, prune_on_disable: bool) -> Self {
        self.prune_on_disable = prune_on_disable;
        self
    }

    /// Returns the output tree.
    pub fn tree(&self) -> &OutputTree {
        &self.tree
    }

    /// Applies one event.
    #[tracing::instrument(
        skip(self, event),
        fields(event = %event.kind, coordinate = %event.coordinate),
        target = TRACING_TARGET
    )]
    pub async fn dispatch(&self, event: &LifecycleEvent) -> DispatchOutcome {
        let coordinate = &event.coordinate;

        match &event.kind {
            EventKind::VersionCreated => self.generate(coordinate).await,
            EventKind::VersionStateChanged { new_state } if new_state.is_enabled() => {
                self.generate(coordinate).await
            }
            EventKind::VersionStateChanged { .. } if self.prune_on_disable => {
                self.prune(coordinate).await
            }
            EventKind::VersionStateChanged { new_state } => {
                tracing::info!(
                    target: TRACING_TARGET,
                    coordinate = %coordinate,
                    new_state = %new_state,
                    "Version is not enabled, skipping"
                );
                DispatchOutcome::Ignored
            }
            EventKind::ArtifactDeleted => self.delete_artifact(coordinate).await,
            EventKind::VersionDeleted => self.delete_version(coordinate).await,
            EventKind::Other(raw) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    event_type = %raw,
                    coordinate = %coordinate,
                    "Ignoring unhandled event type"
                );
                DispatchOutcome::Ignored
            }
        }
    }

    /// Fetches a version and, if the registry reports it enabled, writes
    /// one document per mode.
    async fn generate(&self, coordinate: &ArtifactCoordinate) -> DispatchOutcome {
        let version = match self.store.fetch(coordinate).await {
            Ok(version) => version,
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    coordinate = %coordinate,
                    error = %error,
                    "Dropping event, artifact version could not be fetched"
                );
                return DispatchOutcome::FetchFailed;
            }
        };

        if !version.state.is_enabled() {
            tracing::info!(
                target: TRACING_TARGET,
                coordinate = %coordinate,
                state = %version.state,
                "Registry reports version as not enabled, skipping generation"
            );
            return DispatchOutcome::SkippedNotEnabled(version.state);
        }

        let mut report = GenerationReport::default();
        for mode in GenerationMode::ALL {
            match self.generate_mode(coordinate, &version.content, mode).await {
                Ok(path) => report.written.push((mode, path)),
                Err(error) => {
                    tracing::error!(
                        target: TRACING_TARGET,
                        coordinate = %coordinate,
                        mode = %mode,
                        error = %error,
                        context = ?error.context,
                        "Failed to produce policy document"
                    );
                    report.failed.push(mode);
                }
            }
        }

        if report.is_complete() {
            tracing::info!(
                target: TRACING_TARGET,
                coordinate = %coordinate,
                written = report.written.len(),
                "Generated policies"
            );
        } else {
            tracing::warn!(
                target: TRACING_TARGET,
                coordinate = %coordinate,
                written = report.written.len(),
                failed = ?report.failed,
                "Generated policies partially"
            );
        }

        DispatchOutcome::Generated(report)
    }

    /// Deletes a version's policies once the registry confirms it is no
    /// longer enabled.
    async fn prune(&self, coordinate: &ArtifactCoordinate) -> DispatchOutcome {
        let version = match self.store.fetch(coordinate).await {
            Ok(version) => version,
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    coordinate = %coordinate,
                    error = %error,
                    "Keeping policies, artifact version state could not be fetched"
                );
                return DispatchOutcome::FetchFailed;
            }
        };

        if version.state.is_enabled() {
            tracing::info!(
                target: TRACING_TARGET,
                coordinate = %coordinate,
                "Registry still reports version as enabled, keeping its policies"
            );
            return DispatchOutcome::Ignored;
        }

        tracing::info!(
            target: TRACING_TARGET,
            coordinate = %coordinate,
            state = %version.state,
            "Version left the enabled state, pruning its policies"
        );
        self.delete_version(coordinate).await
    }

    async fn generate_mode(
        &self,
        coordinate: &ArtifactCoordinate,
        content: &[u8],
        mode: GenerationMode,
    ) -> apisync_core::Result<std::path::PathBuf> {
        let document = self.generator.generate(content, mode).await?;
        self.tree.write(coordinate, mode, document).await
    }

    async fn delete_version(&self, coordinate: &ArtifactCoordinate) -> DispatchOutcome {
        deletion_outcome(coordinate, self.tree.delete_version(coordinate).await)
    }

    async fn delete_artifact(&self, coordinate: &ArtifactCoordinate) -> DispatchOutcome {
        deletion_outcome(coordinate, self.tree.delete_artifact(coordinate).await)
    }
}

fn deletion_outcome(
    coordinate: &ArtifactCoordinate,
    result: apisync_core::Result<bool>,
) -> DispatchOutcome {
    match result {
        Ok(existed) => DispatchOutcome::Deleted { existed },
        Err(error) => {
            tracing::error!(
                target: TRACING_TARGET,
                coordinate = %coordinate,
                error = %error,
                context = ?error.context,
                "Failed to remove policies"
            );
            DispatchOutcome::DeleteFailed
        }
    }
}
