//! SQLite-backed task store.
//!
//! Provides persistent storage for:
//! - Tasks (title, due date, completion, credited pomodoros)
//! - Aggregate task statistics
//! - Key-value store for application state
//!
//! Also implements [`TaskStore`], making this database the delivery target
//! for the attribution loop.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::attribution::TaskStore;
use crate::error::DatabaseError;
use crate::task::Task;

/// Aggregate totals across all tasks.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TaskStats {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub incomplete_tasks: u64,
    pub total_pomodoros: u64,
    /// Whole-percent completion rate, 0 when there are no tasks.
    pub completion_pct: u64,
    /// Pomodoros per task, one decimal place.
    pub avg_pomodoros: f64,
}

/// Due-date buckets over incomplete tasks, relative to a given day.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScheduleStats {
    pub overdue: u64,
    pub due_today: u64,
    pub upcoming: u64,
}

/// SQLite database for tasks and application state.
pub struct TaskDb {
    conn: Connection,
}

impl TaskDb {
    /// Open the database at `~/.config/focusflow/focusflow.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, DatabaseError> {
        let path = data_dir()
            .map_err(|e| DatabaseError::OpenFailed {
                path: "focusflow.db".into(),
                message: e.to_string(),
            })?
            .join("focusflow.db");
        Self::open_at(path)
    }

    /// Open the database at an explicit path.
    ///
    /// Multiple connections to the same file are fine; the attribution
    /// loop opens its own.
    pub fn open_at(path: impl Into<std::path::PathBuf>) -> Result<Self, DatabaseError> {
        let path = path.into();
        let conn = Connection::open(&path).map_err(|e| DatabaseError::OpenFailed {
            path,
            message: e.to_string(),
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database. Primarily for tests.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory().map_err(|e| DatabaseError::OpenFailed {
            path: ":memory:".into(),
            message: e.to_string(),
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS tasks (
                    id          TEXT PRIMARY KEY,
                    title       TEXT NOT NULL,
                    due_date    TEXT,
                    completed   INTEGER NOT NULL DEFAULT 0,
                    pomodoros   INTEGER NOT NULL DEFAULT 0,
                    created_at  TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                -- Indexes for list and schedule queries
                CREATE INDEX IF NOT EXISTS idx_tasks_completed ON tasks(completed);
                CREATE INDEX IF NOT EXISTS idx_tasks_due_date ON tasks(due_date);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    // ── Tasks ────────────────────────────────────────────────────────

    /// Insert a new task.
    ///
    /// # Errors
    /// Returns an error if the insert fails (including duplicate ids).
    pub fn insert(&self, task: &Task) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO tasks (id, title, due_date, completed, pomodoros, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                task.id,
                task.title,
                task.due_date.map(|d| d.to_string()),
                task.completed,
                task.pomodoros,
                task.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fetch a task by id.
    pub fn get(&self, id: &str) -> Result<Option<Task>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, due_date, completed, pomodoros, created_at
             FROM tasks WHERE id = ?1",
        )?;
        match stmt.query_row(params![id], row_to_task) {
            Ok(task) => Ok(Some(task)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List tasks: incomplete first, newest first within each group.
    ///
    /// With `incomplete_only` the completed group is dropped entirely,
    /// which is the candidate list for picking an active task.
    pub fn list(&self, incomplete_only: bool) -> Result<Vec<Task>, DatabaseError> {
        let sql = if incomplete_only {
            "SELECT id, title, due_date, completed, pomodoros, created_at
             FROM tasks WHERE completed = 0
             ORDER BY created_at DESC"
        } else {
            "SELECT id, title, due_date, completed, pomodoros, created_at
             FROM tasks
             ORDER BY completed ASC, created_at DESC"
        };
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], row_to_task)?;
        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }

    /// Update the title. Returns false when no such task exists.
    pub fn update_title(&self, id: &str, title: &str) -> Result<bool, DatabaseError> {
        let rows = self.conn.execute(
            "UPDATE tasks SET title = ?1 WHERE id = ?2",
            params![title, id],
        )?;
        Ok(rows > 0)
    }

    /// Update the due date; `None` clears it. Returns false when no such
    /// task exists.
    pub fn update_due_date(
        &self,
        id: &str,
        due_date: Option<NaiveDate>,
    ) -> Result<bool, DatabaseError> {
        let rows = self.conn.execute(
            "UPDATE tasks SET due_date = ?1 WHERE id = ?2",
            params![due_date.map(|d| d.to_string()), id],
        )?;
        Ok(rows > 0)
    }

    /// Flip completion status. Returns the new status, or `None` when no
    /// such task exists.
    pub fn toggle_completed(&self, id: &str) -> Result<Option<bool>, DatabaseError> {
        let rows = self.conn.execute(
            "UPDATE tasks SET completed = 1 - completed WHERE id = ?1",
            params![id],
        )?;
        if rows == 0 {
            return Ok(None);
        }
        let completed = self.conn.query_row(
            "SELECT completed FROM tasks WHERE id = ?1",
            params![id],
            |row| row.get::<_, bool>(0),
        )?;
        Ok(Some(completed))
    }

    /// Delete a task. Returns false when no such task exists.
    pub fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        let rows = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // ── Stats ────────────────────────────────────────────────────────

    pub fn stats(&self) -> Result<TaskStats, DatabaseError> {
        let (total, completed, pomodoros) = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(completed), 0),
                    COALESCE(SUM(pomodoros), 0)
             FROM tasks",
            [],
            |row| {
                Ok((
                    row.get::<_, u64>(0)?,
                    row.get::<_, u64>(1)?,
                    row.get::<_, u64>(2)?,
                ))
            },
        )?;

        let completion_pct = if total > 0 {
            ((completed as f64 / total as f64) * 100.0).round() as u64
        } else {
            0
        };
        let avg_pomodoros = if total > 0 {
            (pomodoros as f64 / total as f64 * 10.0).round() / 10.0
        } else {
            0.0
        };

        Ok(TaskStats {
            total_tasks: total,
            completed_tasks: completed,
            incomplete_tasks: total - completed,
            total_pomodoros: pomodoros,
            completion_pct,
            avg_pomodoros,
        })
    }

    /// Bucket incomplete tasks with a due date against `today`.
    ///
    /// `today` is injected rather than read from the clock so callers and
    /// tests agree on the boundary.
    pub fn schedule_stats(&self, today: NaiveDate) -> Result<ScheduleStats, DatabaseError> {
        let today = today.to_string();
        let (overdue, due_today, upcoming) = self.conn.query_row(
            "SELECT COALESCE(SUM(due_date < ?1), 0),
                    COALESCE(SUM(due_date = ?1), 0),
                    COALESCE(SUM(due_date > ?1), 0)
             FROM tasks
             WHERE completed = 0 AND due_date IS NOT NULL",
            params![today],
            |row| {
                Ok((
                    row.get::<_, u64>(0)?,
                    row.get::<_, u64>(1)?,
                    row.get::<_, u64>(2)?,
                ))
            },
        )?;
        Ok(ScheduleStats {
            overdue,
            due_today,
            upcoming,
        })
    }

    // ── Key-value ────────────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl TaskStore for TaskDb {
    fn pomodoro_count(
        &self,
        task_id: &str,
    ) -> Result<Option<u32>, Box<dyn std::error::Error + Send + Sync>> {
        let mut stmt = self
            .conn
            .prepare("SELECT pomodoros FROM tasks WHERE id = ?1")?;
        match stmt.query_row(params![task_id], |row| row.get::<_, u32>(0)) {
            Ok(count) => Ok(Some(count)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    fn increment_pomodoros(
        &self,
        task_id: &str,
        current: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let rows = self.conn.execute(
            "UPDATE tasks SET pomodoros = ?1 WHERE id = ?2",
            params![current + 1, task_id],
        )?;
        if rows == 0 {
            return Err(format!("no task with id {task_id}").into());
        }
        Ok(())
    }
}

fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    let due: Option<String> = row.get(2)?;
    let due_date = match due {
        Some(d) => Some(NaiveDate::parse_from_str(&d, "%Y-%m-%d").map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?),
        None => None,
    };
    let created: String = row.get(5)?;
    let created_at = DateTime::parse_from_rfc3339(&created)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        due_date,
        completed: row.get(3)?,
        pomodoros: row.get(4)?,
        created_at,
    })
}
