//! Prelude module for apisync-core.
//!
//! Re-exports the types and traits most worker code needs with a single
//! `use apisync_core::prelude::*;`.

pub use crate::event::{ArtifactCoordinate, EventKind, LifecycleEvent, VersionState};
pub use crate::generate::{GeneratorService, PolicyGenerator};
pub use crate::policy::{GenerationMode, PolicyDocument};
pub use crate::source::{Delivery, EventSource, RawMessage};
pub use crate::store::{ArtifactStore, ArtifactVersion, StoreService};
pub use crate::sync::{SyncOutcome, SyncService, Synchronizer};
pub use crate::{Error, ErrorKind, Result};
