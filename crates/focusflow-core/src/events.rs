use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{DurationConfig, Phase};

/// Every state change in the engine produces an Event.
/// Commands return them; the CLI prints them as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    PhaseSelected {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    DurationsUpdated {
        durations: DurationConfig,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    ActiveTaskChanged {
        task_id: Option<String>,
        at: DateTime<Utc>,
    },
    /// A countdown ran to zero: the transition happened and the clock
    /// stopped. `attributed_task` is the task credited when the completed
    /// phase was Work.
    PhaseCompleted {
        completed: Phase,
        next: Phase,
        completed_cycles: u32,
        attributed_task: Option<String>,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        remaining_secs: u64,
        total_secs: u64,
        running: bool,
        completed_cycles: u32,
        active_task: Option<String>,
        progress: f64,
        at: DateTime<Utc>,
    },
}
