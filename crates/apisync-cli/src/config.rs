//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── nats: NatsConfig          # Stream address, token, topic
//! ├── registry: RegistryConfig  # Registry URL, timeout, TLS
//! └── worker: WorkerConfig      # Pacing, output tree, kuadrantctl, git
//! ```
//!
//! Every flag can also be provided through its environment variable.

use std::process;

use anyhow::Context;
use apisync_nats::NatsConfig;
use apisync_registry::RegistryConfig;
use apisync_worker::WorkerConfig;
use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "apisync")]
#[command(about = "Sync registry lifecycle events into a Kuadrant policy repository")]
#[command(version)]
pub struct Cli {
    /// Event stream connection and subscription.
    #[clap(flatten)]
    pub nats: NatsConfig,

    /// Artifact registry client.
    #[clap(flatten)]
    pub registry: RegistryConfig,

    /// Loop pacing, output tree and subprocess adapters.
    #[clap(flatten)]
    pub worker: WorkerConfig,
}

impl Cli {
    /// Loads a `.env` file (if enabled) and parses CLI arguments.
    ///
    /// The file is read first so clap's `env` fallbacks can see its values.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.nats
            .validate()
            .context("invalid NATS configuration")?;
        self.registry
            .validate()
            .context("invalid registry configuration")?;
        self.worker
            .validate()
            .context("invalid worker configuration")?;
        Ok(())
    }

    /// Logs the configuration without secrets.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            "Starting apisync"
        );

        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?enabled_features(),
            "Build information"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            nats_url = %self.nats.nats_url,
            nats_token = self.nats.nats_token.is_some(),
            topic = %self.nats.topic,
            consumer = %self.nats.consumer_name,
            "Stream configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            registry_url = %self.registry.registry_url,
            http_timeout_secs = self.registry.http_timeout,
            registry_insecure = self.registry.registry_insecure,
            "Registry configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            batch_size = self.worker.batch_size,
            poll_timeout_secs = self.worker.poll_timeout,
            idle_threshold_secs = self.worker.idle_threshold,
            output_dir = ?self.worker.output_dir,
            kuadrantctl = %self.worker.kuadrantctl_path.display(),
            prune_on_disable = self.worker.prune_on_disable,
            git_skip_push = self.worker.git_skip_push,
            "Worker configuration"
        );
    }
}

/// Returns a list of enabled compile-time features.
fn enabled_features() -> Vec<&'static str> {
    [cfg!(feature = "dotenv").then_some("dotenv")]
        .into_iter()
        .flatten()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::CommandFactory;

    use super::*;

    const REQUIRED: [&str; 7] = [
        "apisync",
        "--nats-url",
        "nats://localhost:4222",
        "--topic",
        "registry-events",
        "--registry-url",
        "https://registry.example.com/apis/registry/v3",
    ];

    #[test]
    fn test_command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_apply() {
        let cli = Cli::try_parse_from(REQUIRED).unwrap();

        assert_eq!(cli.nats.topic, "registry-events");
        assert_eq!(cli.registry.http_timeout, 30);
        assert!(!cli.registry.registry_insecure);
        assert_eq!(cli.worker.batch_size, 10);
        assert_eq!(cli.worker.poll_timeout, 5);
        assert_eq!(cli.worker.idle_threshold, 10);
        assert_eq!(cli.worker.kuadrantctl_path, PathBuf::from("kuadrantctl"));
        assert!(cli.nats.consumer_name.starts_with("apisync-"));
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_overrides_apply() {
        let mut args = REQUIRED.to_vec();
        args.extend([
            "--batch-size",
            "50",
            "--output-dir",
            "/srv/policies",
            "--prune-on-disable",
            "--git-skip-push",
            "--registry-insecure",
        ]);
        let cli = Cli::try_parse_from(args).unwrap();

        assert_eq!(cli.worker.batch_size, 50);
        assert_eq!(cli.worker.output_dir, Some(PathBuf::from("/srv/policies")));
        assert!(cli.worker.prune_on_disable);
        assert!(cli.worker.git_skip_push);
        assert!(cli.registry.registry_insecure);
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let mut args = REQUIRED.to_vec();
        args.extend(["--idle-threshold", "2"]);
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.validate().is_err());

        let mut args = REQUIRED.to_vec();
        args[2] = "http://localhost:4222";
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.validate().is_err());
    }
}
