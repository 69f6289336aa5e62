use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use apisync_core::sync::COMMIT_MESSAGE;
use apisync_core::{Error, Result, SyncOutcome, Synchronizer};
use tokio::process::Command;

use super::{TRACING_TARGET, stderr_excerpt};
use crate::output::STAGING_PATHSPEC;

/// Stages, commits and pushes the output tree with the `git` CLI.
///
/// The output root must lie inside a working copy whose current branch has
/// an upstream to push to.
#[derive(Debug, Clone)]
pub struct GitSynchronizer {
    binary: PathBuf,
    skip_push: bool,
}

impl GitSynchronizer {
    /// Creates a synchronizer using `git` from `PATH`.
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("git"),
            skip_push: false,
        }
    }

    /// Commits locally without pushing.
    #[must_use]
    pub fn with_skip_push(mut self, skip_push: bool) -> Self {
        self.skip_push = skip_push;
        self
    }

    /// Uses a different `git` binary.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    async fn git(&self, root: &Path, step: &'static str, args: &[&str]) -> Result<Output> {
        tracing::debug!(
            target: TRACING_TARGET,
            root = %root.display(),
            step,
            "Running git"
        );

        let output = Command::new(&self.binary)
            .arg("-C")
            .arg(root)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                Error::sync()
                    .with_message(format!("failed to run git {step}"))
                    .with_context(self.binary.display().to_string())
                    .with_source(e)
            })?;

        if !output.status.success() {
            return Err(Error::sync()
                .with_message(format!("git {step} failed with {}", output.status))
                .with_context(stderr_excerpt(&output.stderr)));
        }

        Ok(output)
    }

    /// Pushes commits an earlier run recorded but failed to push.
    async fn push_unpushed(&self, root: &Path) -> Result<SyncOutcome> {
        if self.skip_push {
            return Ok(SyncOutcome::NoChanges);
        }

        let ahead = self
            .git(root, "rev-list", &["rev-list", "--count", "@{upstream}..HEAD"])
            .await?;
        if count_is_zero(&ahead.stdout) {
            return Ok(SyncOutcome::NoChanges);
        }

        tracing::info!(
            target: TRACING_TARGET,
            root = %root.display(),
            ahead = %String::from_utf8_lossy(&ahead.stdout).trim(),
            "Pushing earlier commits"
        );
        self.git(root, "push", &["push"]).await?;
        Ok(SyncOutcome::Pushed)
    }
}

impl Default for GitSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Synchronizer for GitSynchronizer {
    async fn synchronize(&self, root: &Path) -> Result<SyncOutcome> {
        self.git(root, "add", &["add", "--", ".", STAGING_PATHSPEC])
            .await?;

        let status = self
            .git(
                root,
                "status",
                &["status", "--porcelain", "--", ".", STAGING_PATHSPEC],
            )
            .await?;
        if !has_staged_changes(&status.stdout) {
            tracing::info!(
                target: TRACING_TARGET,
                root = %root.display(),
                "Nothing to commit"
            );
            return self.push_unpushed(root).await;
        }

        self.git(root, "commit", &["commit", "-m", COMMIT_MESSAGE])
            .await?;

        if self.skip_push {
            tracing::info!(
                target: TRACING_TARGET,
                root = %root.display(),
                "Committed without pushing"
            );
            return Ok(SyncOutcome::Committed);
        }

        self.git(root, "push", &["push"]).await?;
        Ok(SyncOutcome::Pushed)
    }
}

/// Returns true if any porcelain status line has an index-side change.
fn has_staged_changes(porcelain: &[u8]) -> bool {
    String::from_utf8_lossy(porcelain)
        .lines()
        .filter_map(|line| line.chars().next())
        .any(|index| !matches!(index, ' ' | '?' | '!'))
}

/// Returns true if `git rev-list --count` printed zero.
fn count_is_zero(stdout: &[u8]) -> bool {
    String::from_utf8_lossy(stdout).trim() == "0"
}
