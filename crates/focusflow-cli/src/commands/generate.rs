//! Gemini-backed task generation.

use focusflow_core::storage::{Config, TaskDb};
use focusflow_core::task::Task;
use focusflow_core::taskgen::GeminiClient;

pub fn run(prompt: &str, save: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let client = GeminiClient::from_env(config.generator.model)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let generated = runtime.block_on(client.generate_tasks(prompt))?;

    println!("{}", serde_json::to_string_pretty(&generated)?);

    if save {
        let db = TaskDb::open()?;
        for item in &generated {
            let task = Task::new(item.title.clone(), None);
            db.insert(&task)?;
            println!("Task created: {}", task.id);
        }
    }
    Ok(())
}
