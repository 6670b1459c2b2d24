//! # FocusFlow Core Library
//!
//! Core business logic for the FocusFlow Pomodoro timer. All operations are
//! available through this library; the CLI binary is a thin layer over it.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a pure countdown state machine advanced by an
//!   external driver calling `tick()` once per second
//! - **Attribution**: fire-and-forget crediting of completed work phases
//!   to tasks over an async channel
//! - **Storage**: SQLite-based task store and TOML-based configuration
//! - **Taskgen**: Gemini-backed generation of task lists from prompts
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: core timer state machine
//! - [`SessionAttributor`]: write-only bridge to the task store
//! - [`TaskDb`]: task and statistics persistence
//! - [`Config`]: application configuration management

pub mod attribution;
pub mod error;
pub mod events;
pub mod storage;
pub mod task;
pub mod taskgen;
pub mod timer;

pub use attribution::{forward_attributions, Attribution, SessionAttributor, TaskStore};
pub use error::{ConfigError, CoreError, DatabaseError, Result, TaskGenError};
pub use events::Event;
pub use storage::{Config, ScheduleStats, TaskDb, TaskStats};
pub use task::Task;
pub use taskgen::{GeminiClient, GeneratedTask};
pub use timer::{DurationConfig, Phase, TimerEngine, TimerError, TimerState};
