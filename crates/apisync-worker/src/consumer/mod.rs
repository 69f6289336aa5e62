//! Batch consumption loop with idle-triggered flush.

mod consumption;
mod idle;
mod settings;
mod summary;

pub use consumption::ConsumptionLoop;
pub use idle::IdleClock;
pub use settings::LoopSettings;
pub use summary::{RunOutcome, RunStats, RunSummary};
