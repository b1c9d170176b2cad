pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use crate::commands::exec::ExecArgs;

#[derive(Debug, Parser)]
#[command(
    name = "grabba",
    about = "Grabba operations command CLI",
    long_about = "Ask operational questions, execute actions, run the autopilot, and manage the operations database.",
    after_help = "Examples:\n  grabba ask --demo /unpaid\n  grabba exec assign_driver --ids route-1 --driver-id driver-2\n  grabba exec export_data --results unpaid.json\n  grabba autopilot --inputs signals.json\n  grabba doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Interpret a natural-language command or /shortcut and return matching records")]
    Ask {
        #[arg(required = true, num_args = 1.., help = "Command text, e.g. `unpaid over $500`")]
        text: Vec<String>,
        #[arg(long, help = "Run against a freshly seeded in-memory dataset")]
        demo: bool,
    },
    #[command(about = "Execute a named action against operational records")]
    Exec {
        #[arg(help = "Action name, e.g. assign_driver or update_invoice_status")]
        action: String,
        #[arg(long, value_delimiter = ',', help = "Comma-separated target record ids")]
        ids: Vec<String>,
        #[arg(long)]
        driver_id: Option<String>,
        #[arg(long)]
        brand: Option<String>,
        #[arg(long)]
        quantity: Option<u32>,
        #[arg(long)]
        message: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        price: Option<Decimal>,
        #[arg(long, help = "Due date as YYYY-MM-DD")]
        due_date: Option<NaiveDate>,
        #[arg(long, help = "JSON file of result rows (e.g. saved `grabba ask` output) for export_data")]
        results: Option<PathBuf>,
        #[arg(long, help = "Run against a freshly seeded in-memory dataset")]
        demo: bool,
    },
    #[command(about = "Build an intelligence snapshot from a JSON inputs file and generate tasks")]
    Autopilot {
        #[arg(long, help = "Path to the intelligence inputs JSON document")]
        inputs: PathBuf,
        #[arg(long, help = "Only return tasks routed to this floor (0-8)")]
        floor: Option<u8>,
    },
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Replace and verify the deterministic demo dataset")]
    Seed,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, DB connectivity, and schema readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Ask { text, demo } => commands::ask::run(&text.join(" "), demo),
        Command::Exec {
            action,
            ids,
            driver_id,
            brand,
            quantity,
            message,
            status,
            tag,
            title,
            name,
            price,
            due_date,
            results,
            demo,
        } => commands::exec::run(&ExecArgs {
            action,
            ids,
            driver_id,
            brand,
            quantity,
            message,
            status,
            tag,
            title,
            name,
            price,
            due_date,
            results,
            demo,
        }),
        Command::Autopilot { inputs, floor } => commands::autopilot::run(&inputs, floor),
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
