use chrono::Local;
use clap::Subcommand;
use focusflow_core::storage::TaskDb;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Totals, completion rate and pomodoro counts
    Summary,
    /// Overdue, due-today and upcoming counts for incomplete tasks
    Schedule,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = TaskDb::open()?;

    match action {
        StatsAction::Summary => {
            let stats = db.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Schedule => {
            let stats = db.schedule_stats(Local::now().date_naive())?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}
