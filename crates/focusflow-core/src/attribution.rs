//! Session attribution: the bridge between a completed work phase and the
//! external task store.
//!
//! The engine hands the active task id to [`SessionAttributor::attribute`]
//! at the moment a work phase completes. Delivery happens on the far side
//! of an unbounded channel, so a slow or failing store can never stall or
//! corrupt the countdown. At-most-once intent: a lost message or failed
//! write costs one record and nothing retries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// One completed work phase worth crediting to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    pub task_id: String,
    pub at: DateTime<Utc>,
}

/// Write-only handle held by the timer engine.
///
/// Holds nothing but the sending end of the channel; the task id is passed
/// in per call, never cached here.
#[derive(Debug, Clone)]
pub struct SessionAttributor {
    tx: UnboundedSender<Attribution>,
}

impl SessionAttributor {
    /// Create the attributor and the receiving end a delivery loop consumes.
    ///
    /// Dropping the receiver is a valid "no store attached" mode: sends
    /// become silent no-ops.
    pub fn channel() -> (Self, UnboundedReceiver<Attribution>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Credit one completed work phase to `task_id`.
    ///
    /// `None` means no task was selected and nothing is recorded. Send
    /// failure is ignored: losing a record must never affect the timer.
    pub fn attribute(&self, task_id: Option<&str>) {
        let Some(id) = task_id else {
            return;
        };
        let _ = self.tx.send(Attribution {
            task_id: id.to_string(),
            at: Utc::now(),
        });
    }
}

/// External task store the delivery loop writes to.
///
/// `increment_pomodoros` records `current + 1`, where `current` is whatever
/// `pomodoro_count` returned just before. The engine's local cycle count
/// stays authoritative; the store is a best-effort mirror.
pub trait TaskStore: Send {
    fn pomodoro_count(
        &self,
        task_id: &str,
    ) -> Result<Option<u32>, Box<dyn std::error::Error + Send + Sync>>;

    fn increment_pomodoros(
        &self,
        task_id: &str,
        current: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Drain attributions into the store until the sending side closes.
///
/// Every failure is logged and swallowed here; nothing reaches back into
/// the engine.
pub async fn forward_attributions(
    mut rx: UnboundedReceiver<Attribution>,
    store: Box<dyn TaskStore>,
) {
    while let Some(attribution) = rx.recv().await {
        let current = match store.pomodoro_count(&attribution.task_id) {
            Ok(Some(count)) => count,
            Ok(None) => {
                tracing::warn!(task_id = %attribution.task_id, "attributed task no longer exists");
                continue;
            }
            Err(e) => {
                tracing::warn!(
                    task_id = %attribution.task_id,
                    error = %e,
                    "failed to read pomodoro count"
                );
                continue;
            }
        };
        if let Err(e) = store.increment_pomodoros(&attribution.task_id, current) {
            tracing::warn!(
                task_id = %attribution.task_id,
                error = %e,
                "failed to record pomodoro"
            );
        } else {
            tracing::debug!(task_id = %attribution.task_id, count = current + 1, "pomodoro recorded");
        }
    }
}
