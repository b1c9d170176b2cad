use grabba_core::config::AppConfig;
use grabba_db::migrations;
use serde::Serialize;

use crate::commands::{load_config, open_pool, runtime, CommandResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 6 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match load_config("doctor") {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.extend(check_database(&config));
        }
        Err(result) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: failure_message(&result),
            });
            for name in ["database_connectivity", "schema_ready"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

/// Connectivity first; the schema check only runs against a reachable database.
fn check_database(config: &AppConfig) -> [DoctorCheck; 2] {
    let runtime = match runtime("doctor") {
        Ok(runtime) => runtime,
        Err(result) => {
            return [
                DoctorCheck {
                    name: "database_connectivity",
                    status: CheckStatus::Fail,
                    details: failure_message(&result),
                },
                DoctorCheck {
                    name: "schema_ready",
                    status: CheckStatus::Skipped,
                    details: "skipped because the async runtime did not start".to_string(),
                },
            ];
        }
    };

    runtime.block_on(async {
        let pool = match open_pool(config).await {
            Ok(pool) => pool,
            Err((_, message, _)) => {
                return [
                    DoctorCheck {
                        name: "database_connectivity",
                        status: CheckStatus::Fail,
                        details: format!("failed to connect to database: {message}"),
                    },
                    DoctorCheck {
                        name: "schema_ready",
                        status: CheckStatus::Skipped,
                        details: "skipped because the database is unreachable".to_string(),
                    },
                ];
            }
        };

        let connectivity = DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Pass,
            details: format!("connected using `{}`", config.database.url),
        };

        let schema = match migrations::schema_ready(&pool).await {
            Ok(true) => DoctorCheck {
                name: "schema_ready",
                status: CheckStatus::Pass,
                details: "operational_record table present".to_string(),
            },
            Ok(false) => DoctorCheck {
                name: "schema_ready",
                status: CheckStatus::Fail,
                details: "operational_record table missing; run `grabba migrate`".to_string(),
            },
            Err(error) => DoctorCheck {
                name: "schema_ready",
                status: CheckStatus::Fail,
                details: format!("schema inspection failed: {error}"),
            },
        };

        pool.close().await;
        [connectivity, schema]
    })
}

fn failure_message(result: &CommandResult) -> String {
    serde_json::from_str::<serde_json::Value>(&result.output)
        .ok()
        .and_then(|payload| payload["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| result.output.clone())
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
