//! Worker configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::consumer::LoopSettings;
use crate::{Result, WorkerError};

/// Default number of messages requested per poll.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Default time a single poll waits for messages, in seconds.
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 5;

/// Default accumulated idle time that ends a run, in seconds.
pub const DEFAULT_IDLE_THRESHOLD_SECS: u64 = 10;

/// Default policy generator binary, resolved through `PATH`.
pub const DEFAULT_KUADRANTCTL: &str = "kuadrantctl";

/// Complete worker configuration.
///
/// Stream and registry connection settings live in their own crates; this
/// type covers loop pacing, the output tree and the subprocess adapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct WorkerConfig {
    /// Maximum number of messages requested per poll
    #[cfg_attr(
        feature = "config",
        arg(long = "batch-size", env = "BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)
    )]
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Seconds a single poll waits for messages
    #[cfg_attr(
        feature = "config",
        arg(long = "poll-timeout", env = "POLL_TIMEOUT_SECS", default_value_t = DEFAULT_POLL_TIMEOUT_SECS)
    )]
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout: u64,

    /// Seconds of consecutive empty polls after which the run syncs and stops
    #[cfg_attr(
        feature = "config",
        arg(long = "idle-threshold", env = "IDLE_THRESHOLD_SECS", default_value_t = DEFAULT_IDLE_THRESHOLD_SECS)
    )]
    #[serde(default = "default_idle_threshold")]
    pub idle_threshold: u64,

    /// Root of the generated policy tree (defaults to ../api-resources/api-resources)
    #[cfg_attr(feature = "config", arg(long = "output-dir", env = "OUTPUT_DIR"))]
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Path of the kuadrantctl binary
    #[cfg_attr(
        feature = "config",
        arg(long = "kuadrantctl-path", env = "KUADRANTCTL_PATH", default_value = DEFAULT_KUADRANTCTL)
    )]
    #[serde(default = "default_kuadrantctl_path")]
    pub kuadrantctl_path: PathBuf,

    /// Delete a version's policies when it leaves the ENABLED state
    #[cfg_attr(
        feature = "config",
        arg(long = "prune-on-disable", env = "PRUNE_ON_DISABLE", default_value_t = false)
    )]
    #[serde(default)]
    pub prune_on_disable: bool,

    /// Commit the output tree without pushing it
    #[cfg_attr(
        feature = "config",
        arg(long = "git-skip-push", env = "GIT_SKIP_PUSH", default_value_t = false)
    )]
    #[serde(default)]
    pub git_skip_push: bool,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_poll_timeout() -> u64 {
    DEFAULT_POLL_TIMEOUT_SECS
}

fn default_idle_threshold() -> u64 {
    DEFAULT_IDLE_THRESHOLD_SECS
}

fn default_kuadrantctl_path() -> PathBuf {
    PathBuf::from(DEFAULT_KUADRANTCTL)
}

/// Returns `<parent of cwd>/api-resources/api-resources`.
fn default_output_root(cwd: &Path) -> PathBuf {
    cwd.parent()
        .unwrap_or(cwd)
        .join("api-resources")
        .join("api-resources")
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            poll_timeout: DEFAULT_POLL_TIMEOUT_SECS,
            idle_threshold: DEFAULT_IDLE_THRESHOLD_SECS,
            output_dir: None,
            kuadrantctl_path: default_kuadrantctl_path(),
            prune_on_disable: false,
            git_skip_push: false,
        }
    }
}

impl WorkerConfig {
    /// Sets the output root.
    #[must_use]
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }

    /// Sets batch size, poll timeout and idle threshold.
    #[must_use]
    pub fn with_pacing(mut self, batch_size: usize, poll_timeout: u64, idle_threshold: u64) -> Self {
        self.batch_size = batch_size;
        self.poll_timeout = poll_timeout;
        self.idle_threshold = idle_threshold;
        self
    }

    /// Validates the pacing values and converts them into loop settings.
    pub fn loop_settings(&self) -> Result<LoopSettings> {
        LoopSettings::new(
            self.batch_size,
            Duration::from_secs(self.poll_timeout),
            Duration::from_secs(self.idle_threshold),
        )
    }

    /// Resolves the output root against the current working directory.
    pub fn output_root(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.output_dir {
            return Ok(dir.clone());
        }

        let cwd = std::env::current_dir()
            .map_err(|e| WorkerError::output_root("cannot read working directory", e))?;
        Ok(default_output_root(&cwd))
    }

    /// Validates the whole configuration.
    pub fn validate(&self) -> Result<()> {
        self.loop_settings()?;

        if self.kuadrantctl_path.as_os_str().is_empty() {
            return Err(WorkerError::invalid_config(
                "kuadrantctl path cannot be empty",
            ));
        }
        if self
            .output_dir
            .as_deref()
            .is_some_and(|dir| dir.as_os_str().is_empty())
        {
            return Err(WorkerError::invalid_config("output directory cannot be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.poll_timeout, 5);
        assert_eq!(config.idle_threshold, 10);
        assert_eq!(config.kuadrantctl_path, PathBuf::from("kuadrantctl"));
        assert!(!config.prune_on_disable);
        assert!(!config.git_skip_push);
        assert!(config.validate().is_ok());

        let settings = config.loop_settings().unwrap();
        assert_eq!(settings.batch_size(), 10);
        assert_eq!(settings.poll_timeout(), Duration::from_secs(5));
        assert_eq!(settings.idle_threshold(), Duration::from_secs(10));
    }

    #[test]
    fn test_default_output_root_is_sibling_of_cwd() {
        assert_eq!(
            default_output_root(Path::new("/work/consumer")),
            PathBuf::from("/work/api-resources/api-resources")
        );
        assert_eq!(
            default_output_root(Path::new("/")),
            PathBuf::from("/api-resources/api-resources")
        );
    }

    #[test]
    fn test_output_dir_override() {
        let config = WorkerConfig::default().with_output_dir("/srv/policies");
        assert_eq!(config.output_root().unwrap(), PathBuf::from("/srv/policies"));
    }

    #[test]
    fn test_invalid_pacing_is_rejected() {
        assert!(WorkerConfig::default().with_pacing(0, 5, 10).validate().is_err());
        assert!(WorkerConfig::default().with_pacing(10, 0, 10).validate().is_err());
        assert!(WorkerConfig::default().with_pacing(10, 5, 4).validate().is_err());
        assert!(WorkerConfig::default().with_pacing(10, 5, 5).validate().is_ok());
    }

    #[test]
    fn test_empty_paths_are_rejected() {
        let config = WorkerConfig {
            kuadrantctl_path: PathBuf::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = WorkerConfig::default().with_output_dir("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: WorkerConfig = serde_json::from_str(r#"{"batch_size": 25}"#).unwrap();
        assert_eq!(config.batch_size, 25);
        assert_eq!(config.poll_timeout, DEFAULT_POLL_TIMEOUT_SECS);
        assert_eq!(config.kuadrantctl_path, PathBuf::from(DEFAULT_KUADRANTCTL));
    }
}
