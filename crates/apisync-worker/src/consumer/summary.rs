use std::fmt;

use apisync_core::SyncOutcome;

use crate::dispatch::DispatchOutcome;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The stream went quiet and the output tree was synchronized.
    Idle {
        /// Result of the synchronization, `None` if it failed.
        sync: Option<SyncOutcome>,
    },
    /// The process was asked to stop; nothing was synchronized.
    Interrupted,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle { sync: Some(outcome) } => write!(f, "idle, sync {outcome:?}"),
            Self::Idle { sync: None } => f.write_str("idle, sync failed"),
            Self::Interrupted => f.write_str("interrupted"),
        }
    }
}

/// Counters collected over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Polls issued.
    pub polls: u64,
    /// Polls that returned nothing.
    pub empty_polls: u64,
    /// Polls whose request itself failed.
    pub failed_polls: u64,
    /// Messages received.
    pub messages: u64,
    /// End-of-partition markers seen.
    pub end_of_partition: u64,
    /// Messages dropped for transport or decode errors.
    pub skipped: u64,
    /// Events handed to the dispatcher.
    pub dispatched: u64,
    /// Versions whose policies were fully generated.
    pub generated: u64,
    /// Subtrees removed or confirmed absent.
    pub deleted: u64,
    /// Events that required no action.
    pub ignored: u64,
    /// Events that were not fully applied.
    pub failed: u64,
}

impl RunStats {
    /// Folds one dispatch result into the counters.
    pub fn record(&mut self, outcome: &DispatchOutcome) {
        self.dispatched += 1;

        if outcome.is_failure() {
            self.failed += 1;
            return;
        }

        match outcome {
            DispatchOutcome::Generated(_) => self.generated += 1,
            DispatchOutcome::Deleted { .. } => self.deleted += 1,
            DispatchOutcome::SkippedNotEnabled(_) | DispatchOutcome::Ignored => self.ignored += 1,
            DispatchOutcome::FetchFailed | DispatchOutcome::DeleteFailed => {}
        }
    }
}

/// Outcome and counters of one run, logged when the loop returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// How the run ended.
    pub outcome: RunOutcome,
    /// What happened along the way.
    pub stats: RunStats,
}

impl RunSummary {
    /// Returns true if the run ended because the stream went quiet.
    pub fn is_idle(&self) -> bool {
        matches!(self.outcome, RunOutcome::Idle { .. })
    }
}
