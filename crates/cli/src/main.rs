use std::process::ExitCode;

use anyhow::{anyhow, Result};
use grabba_core::config::{AppConfig, LoadOptions, LogFormat};
use tracing_subscriber::EnvFilter;

/// Logs go to stderr; stdout carries only the command's JSON payload.
fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))?;
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|error| anyhow!("failed to initialize logging: {error}"))
}

fn main() -> Result<ExitCode> {
    // Config errors are reported by the command itself as structured output.
    if let Ok(config) = AppConfig::load(LoadOptions::default()) {
        init_logging(&config)?;
    }

    Ok(grabba_cli::run())
}
