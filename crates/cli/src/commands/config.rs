use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use grabba_core::config::AppConfig;
use serde::Serialize;
use serde_json::json;
use toml::Value;

use crate::commands::{load_config, CommandResult};

#[derive(Debug, Serialize)]
struct ConfigField {
    key: &'static str,
    value: String,
    source: String,
}

pub fn run() -> CommandResult {
    let config = match load_config("config") {
        Ok(config) => config,
        Err(result) => return result,
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields: Vec<ConfigField> = effective_values(&config)
        .into_iter()
        .map(|(key, env_key, value)| ConfigField {
            key,
            value,
            source: field_source(
                key,
                env_key,
                config_file_doc.as_ref(),
                config_file_path.as_deref(),
            ),
        })
        .collect();

    CommandResult::success_with_data(
        "config",
        "effective config (source precedence: env > file > default)",
        json!({ "fields": fields }),
    )
}

fn effective_values(config: &AppConfig) -> Vec<(&'static str, &'static str, String)> {
    let engine = &config.engine;
    vec![
        ("database.url", "GRABBA_DATABASE_URL", config.database.url.clone()),
        (
            "database.max_connections",
            "GRABBA_DATABASE_MAX_CONNECTIONS",
            config.database.max_connections.to_string(),
        ),
        (
            "database.timeout_secs",
            "GRABBA_DATABASE_TIMEOUT_SECS",
            config.database.timeout_secs.to_string(),
        ),
        ("logging.level", "GRABBA_LOGGING_LEVEL", config.logging.level.clone()),
        ("logging.format", "GRABBA_LOGGING_FORMAT", format!("{:?}", config.logging.format)),
        ("engine.result_limit", "GRABBA_ENGINE_RESULT_LIMIT", engine.result_limit.to_string()),
        (
            "engine.low_stock_days",
            "GRABBA_ENGINE_LOW_STOCK_DAYS",
            engine.low_stock_days.to_string(),
        ),
        (
            "engine.inactive_store_days",
            "GRABBA_ENGINE_INACTIVE_STORE_DAYS",
            engine.inactive_store_days.to_string(),
        ),
        (
            "engine.followup_gap_days",
            "GRABBA_ENGINE_FOLLOWUP_GAP_DAYS",
            engine.followup_gap_days.to_string(),
        ),
        (
            "engine.ambassador_inactive_days",
            "GRABBA_ENGINE_AMBASSADOR_INACTIVE_DAYS",
            engine.ambassador_inactive_days.to_string(),
        ),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("grabba.toml"), PathBuf::from("config/grabba.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var(env_key).is_ok_and(|value| !value.trim().is_empty()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}
