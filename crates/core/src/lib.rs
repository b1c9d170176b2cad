pub mod audit;
pub mod autopilot;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod execution_engine;
pub mod intelligence;
pub mod store;

pub use autopilot::{filter_tasks_by_floor, generate_autopilot_tasks, task_stats, TaskStats};
pub use commands::engine::CommandEngine;
pub use commands::parser::parse_command;
pub use commands::registry::{
    all_shortcuts, intent_by_id, intent_registry, map_action_intent_to_execution,
};
pub use config::{AppConfig, ConfigError, EngineConfig, LoadOptions};
pub use domain::command::{CommandResponse, CommandStatus, IntentId, ParsedCommand, QueryResult};
pub use domain::execution::{ActionParams, ExecutableAction, ExecutionResult};
pub use domain::intelligence::{IntelligenceSnapshot, SmartAlert, StoreRiskProfile};
pub use domain::task::{AutopilotTask, Floor, TaskPriority, TaskType};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use execution_engine::ExecutionEngine;
pub use intelligence::{build_snapshot, IntelligenceInputs};
pub use store::{Collection, OperationsStore, Record, RecordQuery, StoreError};
