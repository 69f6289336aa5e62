#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for NATS client operations.
///
/// Use this target for logging client initialization and configuration.
pub const TRACING_TARGET_CLIENT: &str = "apisync_nats::client";

/// Tracing target for NATS connection operations.
///
/// Use this target for logging connection establishment and connection errors.
pub const TRACING_TARGET_CONNECTION: &str = "apisync_nats::connection";

/// Tracing target for NATS JetStream operations.
///
/// Use this target for logging consumer lifecycle and message fetching.
pub const TRACING_TARGET_STREAM: &str = "apisync_nats::stream";

mod client;
mod error;
mod stream;

pub use client::{NatsClient, NatsConfig};
pub use error::{Error, Result};
pub use stream::JetStreamEventSource;
