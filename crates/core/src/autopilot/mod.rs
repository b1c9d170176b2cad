//! Autopilot: turns an intelligence snapshot into routed, prioritized tasks.

mod generator;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::task::{AutopilotTask, Floor, TaskPriority};

pub use generator::{generate_autopilot_tasks, TOP_STORE_TASK_LIMIT};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub total: usize,
    pub by_priority: PriorityCounts,
    /// Keyed by floor number; floors without tasks are omitted.
    pub by_floor: BTreeMap<u8, usize>,
    pub most_loaded_floor: Option<Floor>,
}

pub fn task_stats(tasks: &[AutopilotTask]) -> TaskStats {
    let mut stats = TaskStats { total: tasks.len(), ..TaskStats::default() };

    for task in tasks {
        match task.priority {
            TaskPriority::Critical => stats.by_priority.critical += 1,
            TaskPriority::High => stats.by_priority.high += 1,
            TaskPriority::Medium => stats.by_priority.medium += 1,
            TaskPriority::Low => stats.by_priority.low += 1,
        }
        *stats.by_floor.entry(task.floor.number()).or_insert(0) += 1;
    }

    // Ascending iteration plus strict comparison keeps the lowest floor on ties.
    let mut busiest: Option<(u8, usize)> = None;
    for (&floor, &count) in &stats.by_floor {
        if busiest.map_or(true, |(_, best)| count > best) {
            busiest = Some((floor, count));
        }
    }
    stats.most_loaded_floor = busiest.and_then(|(floor, _)| Floor::from_number(floor));
    stats
}

pub fn filter_tasks_by_floor(tasks: &[AutopilotTask], floor: Floor) -> Vec<AutopilotTask> {
    tasks.iter().filter(|task| task.floor == floor).cloned().collect()
}
