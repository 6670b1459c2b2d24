//! End-to-end tests for the work-session attribution pipeline: timer
//! engine → attribution channel → delivery loop → task database.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use focusflow_core::attribution::{forward_attributions, SessionAttributor, TaskStore};
use focusflow_core::storage::TaskDb;
use focusflow_core::task::Task;
use focusflow_core::timer::{DurationConfig, Phase, TimerEngine, TimerState};

fn classic_config() -> DurationConfig {
    DurationConfig::default()
}

fn minute_config() -> DurationConfig {
    DurationConfig {
        work_minutes: 1,
        short_break_minutes: 1,
        long_break_minutes: 1,
        cycles_per_long_break: 4,
    }
}

/// Drive the current phase to its boundary, asserting no early completion.
fn finish_phase(engine: &mut TimerEngine) {
    engine.start();
    let ticks = engine.remaining_secs();
    for _ in 0..ticks - 1 {
        assert!(engine.tick().is_none());
    }
    assert!(engine.tick().is_some());
}

/// Store whose reads and writes fail for chosen ids and succeed otherwise.
struct FlakyStore {
    counts: Arc<Mutex<HashMap<String, u32>>>,
    read_fails: &'static str,
    write_fails: &'static str,
}

impl TaskStore for FlakyStore {
    fn pomodoro_count(
        &self,
        task_id: &str,
    ) -> Result<Option<u32>, Box<dyn std::error::Error + Send + Sync>> {
        if task_id == self.read_fails {
            return Err("store read failed".into());
        }
        let current = self.counts.lock().unwrap().get(task_id).copied();
        Ok(Some(current.unwrap_or(0)))
    }

    fn increment_pomodoros(
        &self,
        task_id: &str,
        current: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if task_id == self.write_fails {
            return Err("store write failed".into());
        }
        self.counts
            .lock()
            .unwrap()
            .insert(task_id.to_string(), current + 1);
        Ok(())
    }
}

#[test]
fn test_full_work_phase_attributes_exactly_once() {
    let (attributor, mut rx) = SessionAttributor::channel();
    let mut engine = TimerEngine::new(classic_config(), attributor);
    engine
        .set_active_task(Some("t1".to_string()))
        .unwrap();

    engine.start();
    for _ in 0..1499 {
        assert!(engine.tick().is_none());
    }
    let event = engine.tick();
    assert!(event.is_some(), "tick 1500 must finish the work phase");

    assert_eq!(engine.phase(), Phase::ShortBreak);
    assert_eq!(engine.remaining_secs(), 300);
    assert_eq!(engine.completed_cycles(), 1);
    assert!(!engine.is_running());

    let attribution = rx.try_recv().expect("one attribution should be queued");
    assert_eq!(attribution.task_id, "t1");
    assert!(rx.try_recv().is_err(), "no duplicate attributions");
}

#[test]
fn test_fourth_work_completion_routes_to_long_break() {
    let (attributor, mut rx) = SessionAttributor::channel();
    let seed = TimerState {
        phase: Phase::Work,
        remaining_secs: 3,
        is_running: false,
        completed_cycles: 3,
        active_task: Some("t1".to_string()),
    };
    let mut engine = TimerEngine::with_state(classic_config(), seed, attributor);

    engine.start();
    assert!(engine.tick().is_none());
    assert!(engine.tick().is_none());
    assert!(engine.tick().is_some());

    assert_eq!(engine.completed_cycles(), 4);
    assert_eq!(engine.phase(), Phase::LongBreak);
    assert_eq!(engine.remaining_secs(), 900);
    assert_eq!(rx.try_recv().unwrap().task_id, "t1");
}

#[tokio::test]
async fn test_attribution_lands_in_task_db() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("focusflow.db");

    let db = TaskDb::open_at(&db_path).unwrap();
    let task = Task::new("Write thesis chapter", None);
    db.insert(&task).unwrap();

    let (attributor, rx) = SessionAttributor::channel();
    let mut engine = TimerEngine::new(minute_config(), attributor);
    engine.set_active_task(Some(task.id.clone())).unwrap();

    // Two full work phases, with the breaks in between.
    for _ in 0..2 {
        finish_phase(&mut engine); // work
        finish_phase(&mut engine); // break
    }
    assert_eq!(engine.completed_cycles(), 2);

    // Dropping the engine closes the sender, so the loop drains and exits.
    drop(engine);
    let delivery_db = TaskDb::open_at(&db_path).unwrap();
    forward_attributions(rx, Box::new(delivery_db)).await;

    let stored = db.get(&task.id).unwrap().unwrap();
    assert_eq!(stored.pomodoros, 2);
}

#[tokio::test]
async fn test_unknown_task_is_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("focusflow.db");

    let db = TaskDb::open_at(&db_path).unwrap();
    let task = Task::new("Real task", None);
    db.insert(&task).unwrap();

    let (attributor, rx) = SessionAttributor::channel();
    // One attribution for a task that was deleted, one for a live task.
    attributor.attribute(Some("deleted-task-id"));
    attributor.attribute(Some(task.id.as_str()));
    drop(attributor);

    let delivery_db = TaskDb::open_at(&db_path).unwrap();
    forward_attributions(rx, Box::new(delivery_db)).await;

    let stored = db.get(&task.id).unwrap().unwrap();
    assert_eq!(stored.pomodoros, 1, "delivery continues past unknown ids");
}

#[tokio::test]
async fn test_store_failures_do_not_stop_delivery() {
    let counts = Arc::new(Mutex::new(HashMap::new()));
    let store = FlakyStore {
        counts: Arc::clone(&counts),
        read_fails: "broken-read",
        write_fails: "broken-write",
    };

    let (attributor, rx) = SessionAttributor::channel();
    // A failing read, a failing write, then a task the store accepts.
    attributor.attribute(Some("broken-read"));
    attributor.attribute(Some("broken-write"));
    attributor.attribute(Some("t1"));
    drop(attributor);

    forward_attributions(rx, Box::new(store)).await;

    let counts = counts.lock().unwrap();
    assert_eq!(
        counts.get("t1"),
        Some(&1),
        "delivery continues past store failures"
    );
    assert!(!counts.contains_key("broken-read"));
    assert!(!counts.contains_key("broken-write"));
}

#[test]
fn test_timer_survives_dropped_receiver() {
    let (attributor, rx) = SessionAttributor::channel();
    drop(rx);

    let mut engine = TimerEngine::new(minute_config(), attributor);
    engine.set_active_task(Some("t1".to_string())).unwrap();
    finish_phase(&mut engine);

    // The send failed silently; the phase transition still happened.
    assert_eq!(engine.phase(), Phase::ShortBreak);
    assert_eq!(engine.completed_cycles(), 1);
}
