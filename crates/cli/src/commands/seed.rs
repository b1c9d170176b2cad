use chrono::Utc;
use grabba_db::{migrations, DemoSeedDataset, SqlOperationsStore};
use serde_json::json;

use crate::commands::{load_config, open_pool, runtime, CommandResult, Failure};

/// Replaces any previous demo rows, reloads them dated from today and verifies.
pub fn run() -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match runtime("seed") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let today = Utc::now().date_naive();
    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let removed = DemoSeedDataset::clean(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;
        let store = SqlOperationsStore::new(pool.clone());
        let seeded = DemoSeedDataset::load(&store, today)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;
        let verification = DemoSeedDataset::verify(&store, today)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        pool.close().await;

        if !verification.all_present {
            return Err(("seed_verification", verification_failure(&verification.checks), 6u8));
        }
        Ok::<_, Failure>((removed, seeded))
    });

    match result {
        Ok((removed, seeded)) => {
            let collections: Vec<_> = seeded
                .collections
                .iter()
                .map(|info| {
                    json!({ "collection": info.collection.as_str(), "records": info.records })
                })
                .collect();
            let message = format!(
                "demo dataset loaded: {} records across {} collections",
                seeded.total_records(),
                seeded.collections.len()
            );
            CommandResult::success_with_data(
                "seed",
                message,
                json!({ "replaced": removed, "collections": collections }),
            )
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn verification_failure(checks: &[(&str, bool)]) -> String {
    let failed_checks =
        checks.iter().filter_map(|(check, passed)| (!passed).then_some(*check)).collect::<Vec<_>>();
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for collections: {}", failed_checks.join(", "))
    }
}
