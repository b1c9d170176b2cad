use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use grabba_core::{ActionParams, ExecutionEngine, QueryResult};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::commands::{load_config, runtime, CommandResult, Failure, OpenStore};

/// Actor recorded in the activity log for CLI-initiated actions.
const CLI_ACTOR: &str = "cli";

#[derive(Clone, Debug, Default)]
pub struct ExecArgs {
    pub action: String,
    pub ids: Vec<String>,
    pub driver_id: Option<String>,
    pub brand: Option<String>,
    pub quantity: Option<u32>,
    pub message: Option<String>,
    pub status: Option<String>,
    pub tag: Option<String>,
    pub title: Option<String>,
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    /// JSON file holding result rows for `export_data`.
    pub results: Option<PathBuf>,
    pub demo: bool,
}

impl ExecArgs {
    fn params(&self) -> ActionParams {
        ActionParams {
            entity_ids: self
                .ids
                .iter()
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect(),
            driver_id: self.driver_id.clone(),
            brand: self.brand.clone(),
            quantity: self.quantity,
            message: self.message.clone(),
            status: self.status.clone(),
            tag: self.tag.clone(),
            title: self.title.clone(),
            name: self.name.clone(),
            price: self.price,
            due_date: self.due_date,
            requested_by: Some(CLI_ACTOR.to_string()),
            ..ActionParams::default()
        }
    }
}

pub fn run(args: &ExecArgs) -> CommandResult {
    let config = match load_config("exec") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match runtime("exec") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let mut params = args.params();
    if let Some(path) = &args.results {
        params.results = match load_results(path) {
            Ok(results) => results,
            Err((error_class, message)) => {
                return CommandResult::failure("exec", error_class, message, 2);
            }
        };
    }
    let result = runtime.block_on(async {
        let opened = OpenStore::open(&config, args.demo).await?;
        let engine = ExecutionEngine::new(opened.store.clone());
        let outcome = engine.execute_named(&args.action, &params).await;
        opened.close().await;
        Ok::<_, Failure>(outcome)
    });

    let outcome = match result {
        Ok(outcome) => outcome,
        Err((error_class, message, exit_code)) => {
            return CommandResult::failure("exec", error_class, message, exit_code);
        }
    };

    let data = match serde_json::to_value(&outcome) {
        Ok(data) => data,
        Err(error) => {
            return CommandResult::failure("exec", "serialization", error.to_string(), 3);
        }
    };

    if outcome.success {
        CommandResult::success_with_data("exec", outcome.message, data)
    } else {
        CommandResult::failure_with_data("exec", "execution_failed", outcome.message, data, 7)
    }
}

/// Accepts a bare array of rows, a command response with a `results` field,
/// or the full `grabba ask` output where rows sit under `data.results`.
fn load_results(path: &Path) -> Result<Vec<QueryResult>, (&'static str, String)> {
    let raw = fs::read_to_string(path)
        .map_err(|error| ("input_read", format!("could not read `{}`: {error}", path.display())))?;
    let document: Value = serde_json::from_str(&raw)
        .map_err(|error| ("input_validation", format!("invalid results file: {error}")))?;

    let rows = match document {
        Value::Array(rows) => Value::Array(rows),
        Value::Object(mut object) => match object.remove("results") {
            Some(rows) => rows,
            None => object
                .remove("data")
                .and_then(|mut data| data.get_mut("results").map(Value::take))
                .ok_or_else(|| {
                    ("input_validation", "results file has no `results` array".to_string())
                })?,
        },
        _ => return Err(("input_validation", "results file must hold a JSON array or object".to_string())),
    };
    serde_json::from_value(rows)
        .map_err(|error| ("input_validation", format!("invalid result rows: {error}")))
}
