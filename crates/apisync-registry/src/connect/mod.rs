//! Registry client module.
//!
//! This module provides the HTTP client used to read artifact versions.
//! It wraps the `reqwest` crate.

mod client;
mod config;

pub use client::{RegistryClient, TRACING_TARGET};
pub use config::RegistryConfig;
