mod config;
pub mod task_db;

pub use config::{Config, GeneratorConfig};
pub use task_db::{ScheduleStats, TaskDb, TaskStats};

use std::path::PathBuf;

use crate::error::Result;
use crate::timer::TimerState;

/// kv key under which the CLI keeps the engine snapshot between runs.
pub const TIMER_STATE_KEY: &str = "timer_state";

/// Returns `~/.config/focusflow[-dev]/` based on FOCUSFLOW_ENV.
///
/// FOCUSFLOW_DATA_DIR overrides the location entirely (tests point it at a
/// temp dir). Set FOCUSFLOW_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Ok(override_dir) = std::env::var("FOCUSFLOW_DATA_DIR") {
        let dir = PathBuf::from(override_dir);
        std::fs::create_dir_all(&dir)?;
        return Ok(dir);
    }

    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FOCUSFLOW_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("focusflow-dev")
    } else {
        base_dir.join("focusflow")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Load the persisted timer snapshot, if any.
///
/// An unreadable snapshot is discarded with a warning rather than
/// propagated, so one bad write never bricks the timer commands.
pub fn load_timer_state(db: &TaskDb) -> Result<Option<TimerState>> {
    let Some(raw) = db.kv_get(TIMER_STATE_KEY)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(state) => Ok(Some(state)),
        Err(e) => {
            tracing::warn!(error = %e, "discarding unreadable timer snapshot");
            Ok(None)
        }
    }
}

/// Persist the timer snapshot for the next invocation.
pub fn save_timer_state(db: &TaskDb, state: &TimerState) -> Result<()> {
    let raw = serde_json::to_string(state)?;
    db.kv_set(TIMER_STATE_KEY, &raw)?;
    Ok(())
}
