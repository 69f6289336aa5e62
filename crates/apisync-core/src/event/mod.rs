//! Registry lifecycle events.
//!
//! A [`LifecycleEvent`] is decoded from exactly one stream message, handed to
//! the dispatcher once and then dropped. Nothing about past events is kept
//! between runs.

mod coordinate;
mod decode;
mod state;

use std::fmt;

pub use coordinate::{ArtifactCoordinate, DEFAULT_GROUP};
pub use decode::{ARTIFACT_DELETED, VERSION_CREATED, VERSION_DELETED, VERSION_STATE_CHANGED};
use serde::{Deserialize, Serialize};
pub use state::VersionState;

/// What happened to an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// A new version was registered.
    VersionCreated,
    /// A version moved to another lifecycle state.
    VersionStateChanged {
        /// The state announced by the event.
        new_state: VersionState,
    },
    /// The artifact and every version of it were removed.
    ArtifactDeleted,
    /// A single version was removed.
    VersionDeleted,
    /// Any other registry event, kept by its raw type name.
    Other(String),
}

impl EventKind {
    /// Returns true for kinds that address a single version.
    #[must_use]
    pub fn is_version_scoped(&self) -> bool {
        matches!(
            self,
            Self::VersionCreated | Self::VersionStateChanged { .. } | Self::VersionDeleted
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VersionCreated => f.write_str(VERSION_CREATED),
            Self::VersionStateChanged { .. } => f.write_str(VERSION_STATE_CHANGED),
            Self::ArtifactDeleted => f.write_str(ARTIFACT_DELETED),
            Self::VersionDeleted => f.write_str(VERSION_DELETED),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

/// A decoded registry notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// What happened.
    pub kind: EventKind,
    /// Which artifact, or artifact version, it happened to.
    ///
    /// Always carries a version when [`EventKind::is_version_scoped`] holds.
    pub coordinate: ArtifactCoordinate,
}

impl LifecycleEvent {
    /// Creates an event from already validated parts.
    pub fn new(kind: EventKind, coordinate: ArtifactCoordinate) -> Self {
        Self { kind, coordinate }
    }
}
