use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tracked task.
///
/// `pomodoros` counts the work phases the attribution loop has credited to
/// this task. The due date is a calendar day with no time component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub pomodoros: u32,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// New incomplete task with zero pomodoros and a fresh id.
    pub fn new(title: impl Into<String>, due_date: Option<NaiveDate>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            due_date,
            completed: false,
            pomodoros: 0,
            created_at: Utc::now(),
        }
    }
}
