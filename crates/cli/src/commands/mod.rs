pub mod ask;
pub mod autopilot;
pub mod config;
pub mod doctor;
pub mod exec;
pub mod migrate;
pub mod seed;

use std::sync::Arc;

use chrono::Utc;
use grabba_core::config::{AppConfig, LoadOptions};
use grabba_core::store::OperationsStore;
use grabba_db::{
    connect_with_settings, migrations, DbPool, DemoSeedDataset, InMemoryOperationsStore,
    SqlOperationsStore,
};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

/// `(error_class, message, exit_code)` carried out of async command bodies.
pub(crate) type Failure = (&'static str, String, u8);

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::render(command, None, message.into(), None, 0)
    }

    pub fn success_with_data(command: &str, message: impl Into<String>, data: Value) -> Self {
        Self::render(command, None, message.into(), Some(data), 0)
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        Self::render(command, Some(error_class), message.into(), None, exit_code)
    }

    pub fn failure_with_data(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        data: Value,
        exit_code: u8,
    ) -> Self {
        Self::render(command, Some(error_class), message.into(), Some(data), exit_code)
    }

    fn render(
        command: &str,
        error_class: Option<&str>,
        message: String,
        data: Option<Value>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: if error_class.is_some() { "error" } else { "ok" }.to_string(),
            error_class: error_class.map(str::to_string),
            message,
            data,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            2,
        )
    })
}

pub(crate) fn runtime(command: &str) -> Result<tokio::runtime::Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            3,
        )
    })
}

pub(crate) async fn open_pool(config: &AppConfig) -> Result<DbPool, Failure> {
    connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(|error| ("db_connectivity", error.to_string(), 4u8))
}

/// Store handle for commands that read or write operational records.
pub(crate) struct OpenStore {
    pub store: Arc<dyn OperationsStore>,
    pool: Option<DbPool>,
}

impl OpenStore {
    /// `demo` swaps the configured database for a freshly seeded in-memory store.
    pub async fn open(config: &AppConfig, demo: bool) -> Result<Self, Failure> {
        if demo {
            let store = InMemoryOperationsStore::default();
            DemoSeedDataset::load(&store, Utc::now().date_naive())
                .await
                .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;
            return Ok(Self { store: Arc::new(store), pool: None });
        }

        let pool = open_pool(config).await?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;
        let store = SqlOperationsStore::new(pool.clone());
        Ok(Self { store: Arc::new(store), pool: Some(pool) })
    }

    pub async fn close(self) {
        if let Some(pool) = self.pool {
            pool.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::CommandResult;

    fn parse(result: &CommandResult) -> Value {
        serde_json::from_str(&result.output).expect("valid JSON")
    }

    #[test]
    fn success_omits_data_when_absent() {
        let payload = parse(&CommandResult::success("migrate", "applied pending migrations"));
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["error_class"], Value::Null);
        assert!(payload.get("data").is_none());
    }

    #[test]
    fn failure_carries_class_code_and_data() {
        let result = CommandResult::failure_with_data(
            "exec",
            "execution_failed",
            "Unknown action: fly",
            json!({ "success": false }),
            7,
        );
        assert_eq!(result.exit_code, 7);

        let payload = parse(&result);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "execution_failed");
        assert_eq!(payload["data"]["success"], false);
    }
}
