#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod adapter;
mod config;
pub mod consumer;
pub mod dispatch;
mod error;
pub mod output;

pub use adapter::{GitSynchronizer, KuadrantctlGenerator};
pub use config::WorkerConfig;
pub use consumer::{ConsumptionLoop, IdleClock, LoopSettings, RunOutcome, RunStats, RunSummary};
pub use dispatch::{DispatchOutcome, EventDispatcher, GenerationReport};
pub use error::{Result, WorkerError};
pub use output::OutputTree;
