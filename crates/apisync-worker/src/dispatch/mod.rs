//! Event-to-action dispatch.
//!
//! | Event | Condition | Action |
//! |---|---|---|
//! | version created | | fetch, then generate if the registry says `ENABLED` |
//! | version state changed | new state `ENABLED` | fetch, then generate if the registry says `ENABLED` |
//! | version state changed | any other state | nothing, or with `prune_on_disable` delete the version once the registry confirms it is not `ENABLED` |
//! | artifact deleted | | delete the artifact subtree |
//! | version deleted | | delete the version subtree |
//! | anything else | | nothing |

mod dispatcher;

use std::path::PathBuf;

use apisync_core::{GenerationMode, VersionState};
pub use dispatcher::EventDispatcher;

/// What generating one artifact version produced.
///
/// Modes are independent: a failed mode never prevents the others from
/// being written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Modes whose document reached disk, with the path written.
    pub written: Vec<(GenerationMode, PathBuf)>,
    /// Modes that failed to generate or to write.
    pub failed: Vec<GenerationMode>,
}

impl GenerationReport {
    /// Returns true when every mode was written.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Result of dispatching one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Generation ran for an enabled version.
    Generated(GenerationReport),
    /// The registry reported the version in a state other than `ENABLED`.
    SkippedNotEnabled(VersionState),
    /// A subtree was removed, or was already absent.
    Deleted {
        /// Whether the subtree existed before the event.
        existed: bool,
    },
    /// The event implies no action.
    Ignored,
    /// The registry could not serve the version; the event was dropped.
    FetchFailed,
    /// A subtree could not be removed.
    DeleteFailed,
}

impl DispatchOutcome {
    /// Returns true if the event was not fully applied.
    pub fn is_failure(&self) -> bool {
        match self {
            Self::Generated(report) => !report.is_complete(),
            Self::FetchFailed | Self::DeleteFailed => true,
            Self::SkippedNotEnabled(_) | Self::Deleted { .. } | Self::Ignored => false,
        }
    }
}
