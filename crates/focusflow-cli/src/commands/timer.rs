//! Timer commands: the interactive countdown loop plus one-shot state
//! inspection and mutation.
//!
//! The countdown only advances inside `timer start`. Every other
//! command rebuilds the engine from the persisted snapshot, applies one
//! change and saves it back.

use std::time::Duration;

use clap::Subcommand;
use focusflow_core::attribution::{forward_attributions, SessionAttributor};
use focusflow_core::storage::{self, Config, TaskDb};
use focusflow_core::timer::{Phase, TimerEngine};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run the countdown until the phase completes or Ctrl-C pauses it
    Start {
        /// Task ID to credit with this work session
        #[arg(long)]
        task: Option<String>,
    },
    /// Print the persisted timer state as JSON
    Status,
    /// Rewind the current phase to its full length
    Reset,
    /// Jump to another phase while the timer is idle
    Phase {
        /// Target phase: work, short-break or long-break
        phase: String,
    },
    /// Update the configured durations
    Set {
        /// Work phase length in minutes
        #[arg(long, value_name = "MINUTES")]
        work: Option<u32>,
        /// Short break length in minutes
        #[arg(long, value_name = "MINUTES")]
        short: Option<u32>,
        /// Long break length in minutes
        #[arg(long, value_name = "MINUTES")]
        long: Option<u32>,
        /// Work sessions per long break
        #[arg(long, value_name = "COUNT")]
        cycles: Option<u32>,
    },
    /// Choose or clear the task credited with completed work sessions
    Focus {
        /// Task ID
        id: Option<String>,
        /// Forget the focused task
        #[arg(long, conflicts_with = "id")]
        clear: bool,
    },
}

/// Rebuild the engine from the persisted snapshot.
///
/// One-shot commands never tick, so nothing is ever attributed and the
/// receiver can be dropped straight away.
fn hydrate() -> Result<(TaskDb, TimerEngine), Box<dyn std::error::Error>> {
    let db = TaskDb::open()?;
    let config = Config::load_or_default();
    // A hand-edited config file can carry zero durations; the engine
    // takes the values as given, so they are checked here.
    config.timer.validate()?;
    let (attributor, _rx) = SessionAttributor::channel();
    let engine = match storage::load_timer_state(&db)? {
        Some(state) => TimerEngine::with_state(config.timer, state, attributor),
        None => TimerEngine::new(config.timer, attributor),
    };
    Ok((db, engine))
}

fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

async fn run_countdown(task: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    config.timer.validate()?;

    let db = TaskDb::open()?;

    // The delivery loop owns its own connection; it exits once the
    // engine (and with it the channel sender) is dropped.
    let delivery_db = TaskDb::open()?;
    let (attributor, rx) = SessionAttributor::channel();
    let dispatcher = tokio::spawn(forward_attributions(rx, Box::new(delivery_db)));

    let mut engine = match storage::load_timer_state(&db)? {
        Some(state) => TimerEngine::with_state(config.timer, state, attributor),
        None => TimerEngine::new(config.timer, attributor),
    };
    // A run that died mid-phase leaves a stale running flag behind.
    engine.pause();

    if let Some(id) = task {
        db.get(&id)?.ok_or_else(|| format!("Task not found: {id}"))?;
        engine.set_active_task(Some(id))?;
    }

    if let Some(event) = engine.start() {
        println!("{}", serde_json::to_string_pretty(&event)?);
    }
    storage::save_timer_state(&db, engine.state())?;
    tracing::debug!(
        phase = %engine.phase(),
        remaining_secs = engine.remaining_secs(),
        "countdown running"
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.tick().await; // the first tick fires immediately

    let completion = loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Some(event) = engine.tick() {
                    break Some(event);
                }
                eprint!(
                    "\r{} {}  ",
                    engine.phase().label(),
                    format_clock(engine.remaining_secs())
                );
            }
            _ = tokio::signal::ctrl_c() => break None,
        }
    };
    eprintln!();

    let event = match completion {
        Some(event) => event,
        None => engine.pause().unwrap_or_else(|| engine.snapshot()),
    };
    println!("{}", serde_json::to_string_pretty(&event)?);

    // Consuming the engine closes the sender, so the dispatcher drains
    // its queue and exits.
    let state = engine.into_state();
    storage::save_timer_state(&db, &state)?;
    if let Err(e) = dispatcher.await {
        tracing::warn!(error = %e, "attribution dispatcher ended abnormally");
    }
    Ok(())
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TimerAction::Start { task } => {
            tokio::runtime::Runtime::new()?.block_on(run_countdown(task))
        }
        TimerAction::Status => {
            let (_db, engine) = hydrate()?;
            println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
            Ok(())
        }
        TimerAction::Reset => {
            let (db, mut engine) = hydrate()?;
            if let Some(event) = engine.reset() {
                println!("{}", serde_json::to_string_pretty(&event)?);
            }
            storage::save_timer_state(&db, engine.state())?;
            Ok(())
        }
        TimerAction::Phase { phase } => {
            let (db, mut engine) = hydrate()?;
            let phase: Phase = phase.parse()?;
            let event = engine.select_phase(phase)?;
            storage::save_timer_state(&db, engine.state())?;
            println!("{}", serde_json::to_string_pretty(&event)?);
            Ok(())
        }
        TimerAction::Set {
            work,
            short,
            long,
            cycles,
        } => {
            let (db, mut engine) = hydrate()?;
            let mut config = Config::load_or_default();
            let mut durations = config.timer.clone();
            if let Some(minutes) = work {
                durations.work_minutes = minutes;
            }
            if let Some(minutes) = short {
                durations.short_break_minutes = minutes;
            }
            if let Some(minutes) = long {
                durations.long_break_minutes = minutes;
            }
            if let Some(count) = cycles {
                durations.cycles_per_long_break = count;
            }

            let event = engine.set_durations(durations.clone())?;
            config.timer = durations;
            config.save()?;
            storage::save_timer_state(&db, engine.state())?;
            println!("{}", serde_json::to_string_pretty(&event)?);
            Ok(())
        }
        TimerAction::Focus { id, clear } => {
            let (db, mut engine) = hydrate()?;
            let event = if clear {
                engine.clear_active_task()?
            } else {
                let id = id.ok_or("provide a task id or --clear")?;
                db.get(&id)?.ok_or_else(|| format!("Task not found: {id}"))?;
                engine.set_active_task(Some(id))?
            };
            storage::save_timer_state(&db, engine.state())?;
            println!("{}", serde_json::to_string_pretty(&event)?);
            Ok(())
        }
    }
}
