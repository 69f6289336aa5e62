#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod shutdown;
mod telemetry;

use std::process;

use anyhow::Context;
use apisync_core::{GeneratorService, SyncService};
use apisync_nats::NatsClient;
use apisync_registry::RegistryClient;
use apisync_worker::{
    ConsumptionLoop, EventDispatcher, GitSynchronizer, KuadrantctlGenerator, OutputTree,
    RunSummary,
};
use tokio_util::sync::CancellationToken;

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "apisync_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "apisync_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "apisync_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        process::exit(0);
    };

    let message = format!("{error:#}");
    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %message,
            "apisync terminated with error"
        );
    } else {
        eprintln!("Error: {message}");
    }

    process::exit(1);
}

/// Main application entry point.
///
/// Errors returned from here are startup failures; once the loop runs,
/// every failure is logged and absorbed.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    telemetry::init_tracing()?;
    cli.log();
    cli.validate()?;

    let settings = cli
        .worker
        .loop_settings()
        .context("invalid loop settings")?;
    let root = cli
        .worker
        .output_root()
        .context("failed to resolve the output directory")?;

    let registry =
        RegistryClient::new(cli.registry.clone()).context("failed to create registry client")?;
    let generator =
        GeneratorService::new(KuadrantctlGenerator::new(cli.worker.kuadrantctl_path.clone()));
    let synchronizer =
        SyncService::new(GitSynchronizer::new().with_skip_push(cli.worker.git_skip_push));
    let dispatcher = EventDispatcher::new(registry.into_service(), generator, OutputTree::new(root))
        .with_prune_on_disable(cli.worker.prune_on_disable);

    let client = NatsClient::connect(cli.nats.clone())
        .await
        .context("failed to connect to NATS")?;
    let source = client
        .subscribe()
        .await
        .context("failed to subscribe to the events topic")?;

    let cancel_token = CancellationToken::new();
    let signals = tokio::spawn(shutdown::cancel_on_signal(cancel_token.clone()));

    let summary = ConsumptionLoop::new(source, dispatcher, synchronizer, settings, cancel_token)
        .run()
        .await;

    signals.abort();
    log_summary(&summary);

    Ok(())
}

/// Logs how the run ended.
fn log_summary(summary: &RunSummary) {
    tracing::info!(
        target: TRACING_TARGET_SHUTDOWN,
        outcome = %summary.outcome,
        messages = summary.stats.messages,
        generated = summary.stats.generated,
        deleted = summary.stats.deleted,
        failed = summary.stats.failed,
        "apisync finished"
    );
}
