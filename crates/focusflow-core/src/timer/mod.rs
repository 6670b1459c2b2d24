mod config;
mod engine;

pub use config::{DurationConfig, Phase, TimerError};
pub use engine::{TimerEngine, TimerState};
