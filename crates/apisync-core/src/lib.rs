#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for message decoding.
pub const TRACING_TARGET_DECODE: &str = "apisync_core::decode";

/// Tracing target for artifact store calls.
pub const TRACING_TARGET_STORE: &str = "apisync_core::store";

/// Tracing target for policy generation calls.
pub const TRACING_TARGET_GENERATE: &str = "apisync_core::generate";

/// Tracing target for synchronizer calls.
pub const TRACING_TARGET_SYNC: &str = "apisync_core::sync";

mod error;

pub mod event;
pub mod generate;
pub mod policy;
pub mod prelude;
pub mod source;
pub mod store;
pub mod sync;

#[cfg(feature = "test-utils")]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;

pub use error::{BoxedError, Error, ErrorKind, Result};
pub use event::{ArtifactCoordinate, EventKind, LifecycleEvent, VersionState};
pub use generate::{GeneratorService, PolicyGenerator};
pub use policy::{GenerationMode, PolicyDocument};
pub use source::{Delivery, EventSource, RawMessage};
pub use store::{ArtifactStore, ArtifactVersion, StoreService};
pub use sync::{SyncOutcome, SyncService, Synchronizer};
