use grabba_core::{CommandEngine, CommandStatus};

use crate::commands::{load_config, runtime, CommandResult, Failure, OpenStore};

pub fn run(text: &str, demo: bool) -> CommandResult {
    let config = match load_config("ask") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match runtime("ask") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let opened = OpenStore::open(&config, demo).await?;
        let engine = CommandEngine::new(opened.store.clone(), config.engine.clone());
        let response = engine.process_command(text).await;
        opened.close().await;
        Ok::<_, Failure>(response)
    });

    let response = match result {
        Ok(response) => response,
        Err((error_class, message, exit_code)) => {
            return CommandResult::failure("ask", error_class, message, exit_code);
        }
    };

    tracing::info!(
        event_name = "cli.ask.completed",
        intent = response.command.intent.as_str(),
        result_count = response.results.len(),
        demo,
        "command processed"
    );

    let data = match serde_json::to_value(&response) {
        Ok(data) => data,
        Err(error) => {
            return CommandResult::failure("ask", "serialization", error.to_string(), 3);
        }
    };

    match response.status {
        CommandStatus::Completed => CommandResult::success_with_data("ask", response.summary, data),
        CommandStatus::Error => {
            CommandResult::failure_with_data("ask", "command_failed", response.summary, data, 7)
        }
    }
}
