//! Task management commands.

use chrono::NaiveDate;
use clap::Subcommand;
use focusflow_core::storage::TaskDb;
use focusflow_core::task::Task;

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("invalid date {s:?}: {e}"))
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Create {
        /// Task title
        title: String,
        /// Due date, YYYY-MM-DD
        #[arg(long, value_parser = parse_date)]
        due: Option<NaiveDate>,
    },
    /// List tasks, incomplete first then newest
    List {
        /// Only incomplete tasks
        #[arg(long)]
        incomplete: bool,
    },
    /// Get task details
    Get {
        /// Task ID
        id: String,
    },
    /// Update a task's title or due date
    Update {
        /// Task ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New due date, YYYY-MM-DD
        #[arg(long, value_parser = parse_date, conflicts_with = "clear_due")]
        due: Option<NaiveDate>,
        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
    },
    /// Flip a task between complete and incomplete
    Toggle {
        /// Task ID
        id: String,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = TaskDb::open()?;

    match action {
        TaskAction::Create { title, due } => {
            let task = Task::new(title, due);
            db.insert(&task)?;
            println!("Task created: {}", task.id);
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TaskAction::List { incomplete } => {
            let tasks = db.list(incomplete)?;
            println!("{}", serde_json::to_string_pretty(&tasks)?);
        }
        TaskAction::Get { id } => match db.get(&id)? {
            Some(task) => println!("{}", serde_json::to_string_pretty(&task)?),
            None => println!("Task not found: {id}"),
        },
        TaskAction::Update {
            id,
            title,
            due,
            clear_due,
        } => {
            let mut task = db
                .get(&id)?
                .ok_or_else(|| format!("Task not found: {id}"))?;

            if let Some(t) = title {
                db.update_title(&id, &t)?;
                task.title = t;
            }
            if clear_due {
                db.update_due_date(&id, None)?;
                task.due_date = None;
            } else if let Some(d) = due {
                db.update_due_date(&id, Some(d))?;
                task.due_date = Some(d);
            }

            println!("Task updated:");
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TaskAction::Toggle { id } => {
            db.toggle_completed(&id)?
                .ok_or_else(|| format!("Task not found: {id}"))?;
            if let Some(task) = db.get(&id)? {
                println!("{}", serde_json::to_string_pretty(&task)?);
            }
        }
        TaskAction::Delete { id } => {
            if !db.delete(&id)? {
                return Err(format!("Task not found: {id}").into());
            }
            println!("Task deleted: {id}");
        }
    }
    Ok(())
}
