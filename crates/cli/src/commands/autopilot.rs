use std::fs;
use std::path::Path;

use chrono::Utc;
use grabba_core::{
    build_snapshot, filter_tasks_by_floor, generate_autopilot_tasks, task_stats, Floor,
    IntelligenceInputs,
};
use serde_json::json;

use crate::commands::CommandResult;

/// Runs the intelligence core over `inputs` and prints snapshot, tasks and stats.
pub fn run(inputs: &Path, floor: Option<u8>) -> CommandResult {
    let floor = match floor.map(Floor::try_from).transpose() {
        Ok(floor) => floor,
        Err(message) => return CommandResult::failure("autopilot", "input_validation", message, 2),
    };

    let raw = match fs::read_to_string(inputs) {
        Ok(raw) => raw,
        Err(error) => {
            return CommandResult::failure(
                "autopilot",
                "input_read",
                format!("could not read `{}`: {error}", inputs.display()),
                2,
            );
        }
    };
    let inputs: IntelligenceInputs = match serde_json::from_str(&raw) {
        Ok(inputs) => inputs,
        Err(error) => {
            return CommandResult::failure(
                "autopilot",
                "input_validation",
                format!("invalid intelligence inputs: {error}"),
                2,
            );
        }
    };

    let now = Utc::now();
    let snapshot = build_snapshot(&inputs, now);
    let mut tasks = generate_autopilot_tasks(&snapshot, now);
    if let Some(floor) = floor {
        tasks = filter_tasks_by_floor(&tasks, floor);
    }
    let stats = task_stats(&tasks);

    tracing::info!(
        event_name = "cli.autopilot.completed",
        alerts = snapshot.alerts.len(),
        tasks = tasks.len(),
        floor = floor.map(|floor| floor.number()),
        "autopilot run completed"
    );

    let message = format!(
        "generated {} task(s) from {} alert(s)",
        tasks.len(),
        snapshot.alerts.len()
    );
    CommandResult::success_with_data(
        "autopilot",
        message,
        json!({ "snapshot": snapshot, "tasks": tasks, "stats": stats }),
    )
}
