//! Countdown state machine.
//!
//! The engine owns no thread or timer. An external driver invokes `tick()`
//! once per second while the clock runs; a test harness can call it N times
//! with no real time passing.
//!
//! ## Phase cycle
//!
//! ```text
//! Work -> ShortBreak -> Work -> ... -> Work -> LongBreak -> Work -> ...
//!                 (every cycles_per_long_break-th Work completion)
//! ```
//!
//! The clock stops at every phase boundary. Continuing into the next phase
//! requires an explicit `start()`, keeping each interval a deliberate
//! commitment rather than an automatic chain.
//!
//! ## Usage
//!
//! ```ignore
//! let (attributor, rx) = SessionAttributor::channel();
//! let mut engine = TimerEngine::new(DurationConfig::default(), attributor);
//! engine.start();
//! // Once per second:
//! engine.tick(); // Returns Some(Event::PhaseCompleted) at the boundary
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::config::{DurationConfig, Phase, TimerError};
use crate::attribution::SessionAttributor;
use crate::events::Event;

/// Full machine state.
///
/// Serializable so a caller can keep a snapshot between engine
/// activations; the engine itself never persists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub phase: Phase,
    pub remaining_secs: u64,
    pub is_running: bool,
    pub completed_cycles: u32,
    #[serde(default)]
    pub active_task: Option<String>,
}

impl TimerState {
    /// Initial state: idle at the top of a Work phase.
    pub fn new(durations: &DurationConfig) -> Self {
        Self {
            phase: Phase::Work,
            remaining_secs: durations.phase_secs(Phase::Work),
            is_running: false,
            completed_cycles: 0,
            active_task: None,
        }
    }
}

/// Core timer engine.
///
/// Single-writer: commands and ticks all go through `&mut self`, so no two
/// ticks can interleave. Construction takes the durations as given; callers
/// taking them from user input validate with [`DurationConfig::validate`]
/// first (`set_durations` is the checked mutation path).
pub struct TimerEngine {
    durations: DurationConfig,
    state: TimerState,
    attributor: SessionAttributor,
}

impl TimerEngine {
    /// Create an engine in the initial state.
    pub fn new(durations: DurationConfig, attributor: SessionAttributor) -> Self {
        let state = TimerState::new(&durations);
        Self {
            durations,
            state,
            attributor,
        }
    }

    /// Rebuild an engine from a previously captured snapshot.
    ///
    /// `remaining_secs` is clamped to the current phase length so an
    /// externally edited snapshot cannot violate the countdown invariant.
    pub fn with_state(
        durations: DurationConfig,
        mut state: TimerState,
        attributor: SessionAttributor,
    ) -> Self {
        let cap = durations.phase_secs(state.phase);
        if state.remaining_secs > cap {
            state.remaining_secs = cap;
        }
        Self {
            durations,
            state,
            attributor,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn remaining_secs(&self) -> u64 {
        self.state.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn completed_cycles(&self) -> u32 {
        self.state.completed_cycles
    }

    pub fn active_task(&self) -> Option<&str> {
        self.state.active_task.as_deref()
    }

    pub fn durations(&self) -> &DurationConfig {
        &self.durations
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    /// Countdown length of the current phase in seconds.
    pub fn total_secs(&self) -> u64 {
        self.durations.phase_secs(self.state.phase)
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn progress(&self) -> f64 {
        let total = self.total_secs();
        if total == 0 {
            return 0.0;
        }
        1.0 - (self.state.remaining_secs as f64 / total as f64)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            phase: self.state.phase,
            remaining_secs: self.state.remaining_secs,
            total_secs: self.total_secs(),
            running: self.state.is_running,
            completed_cycles: self.state.completed_cycles,
            active_task: self.state.active_task.clone(),
            progress: self.progress(),
            at: Utc::now(),
        }
    }

    /// Consume the engine, yielding the state for the caller to keep.
    pub fn into_state(self) -> TimerState {
        self.state
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        if self.state.is_running {
            return None; // Already running.
        }
        self.state.is_running = true;
        Some(Event::TimerStarted {
            phase: self.state.phase,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.is_running {
            return None;
        }
        self.state.is_running = false;
        Some(Event::TimerPaused {
            phase: self.state.phase,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Stop the clock and rewind the current phase to its full length.
    ///
    /// `phase` and `completed_cycles` are untouched.
    pub fn reset(&mut self) -> Option<Event> {
        self.state.is_running = false;
        self.state.remaining_secs = self.total_secs();
        Some(Event::TimerReset {
            phase: self.state.phase,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Jump to a phase while idle.
    ///
    /// Never counts as a completion: cycle count and attribution are
    /// untouched.
    pub fn select_phase(&mut self, phase: Phase) -> Result<Event, TimerError> {
        self.ensure_idle("select a phase")?;
        self.state.phase = phase;
        self.state.remaining_secs = self.durations.phase_secs(phase);
        Ok(Event::PhaseSelected {
            phase,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Replace the interval configuration while idle.
    ///
    /// Validation happens before any mutation, so a rejected config leaves
    /// both the durations and the countdown exactly as they were.
    pub fn set_durations(&mut self, durations: DurationConfig) -> Result<Event, TimerError> {
        self.ensure_idle("change durations")?;
        durations.validate()?;
        self.durations = durations;
        // Idle is guaranteed here, so reseed for the possibly changed length.
        self.state.remaining_secs = self.total_secs();
        Ok(Event::DurationsUpdated {
            durations: self.durations.clone(),
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Pick the task credited when the current Work phase completes.
    pub fn set_active_task(&mut self, task_id: Option<String>) -> Result<Event, TimerError> {
        self.ensure_idle("change the active task")?;
        self.state.active_task = task_id;
        Ok(Event::ActiveTaskChanged {
            task_id: self.state.active_task.clone(),
            at: Utc::now(),
        })
    }

    pub fn clear_active_task(&mut self) -> Result<Event, TimerError> {
        self.set_active_task(None)
    }

    /// Advance the clock by one second.
    ///
    /// Returns `None` while the countdown is merely running down, and also
    /// when the clock is stopped, so a straggling driver tick after a pause
    /// is harmless. The tick that exhausts the phase performs the
    /// transition, stops the clock, and returns `Some(Event::PhaseCompleted)`.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.state.is_running {
            return None;
        }
        if self.state.remaining_secs > 0 {
            self.state.remaining_secs -= 1;
        }
        if self.state.remaining_secs > 0 {
            return None;
        }
        Some(self.complete_phase())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn ensure_idle(&self, operation: &str) -> Result<(), TimerError> {
        if self.state.is_running {
            return Err(TimerError::InvalidOperation {
                operation: operation.into(),
            });
        }
        Ok(())
    }

    /// Phase transition at tick-to-zero.
    ///
    /// A Work completion bumps the cycle count, hands the active task to
    /// the attributor, and routes to a long break on every
    /// `cycles_per_long_break`-th completion, judged on the new total. A
    /// break always returns to Work.
    fn complete_phase(&mut self) -> Event {
        let completed = self.state.phase;
        let mut attributed = None;
        let next = match completed {
            Phase::Work => {
                self.state.completed_cycles += 1;
                self.attributor.attribute(self.state.active_task.as_deref());
                attributed = self.state.active_task.clone();
                if self.state.completed_cycles % self.durations.cycles_per_long_break == 0 {
                    Phase::LongBreak
                } else {
                    Phase::ShortBreak
                }
            }
            Phase::ShortBreak | Phase::LongBreak => Phase::Work,
        };
        self.state.phase = next;
        self.state.remaining_secs = self.durations.phase_secs(next);
        self.state.is_running = false;
        Event::PhaseCompleted {
            completed,
            next,
            completed_cycles: self.state.completed_cycles,
            attributed_task: attributed,
            at: Utc::now(),
        }
    }
}
