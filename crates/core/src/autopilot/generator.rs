use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::intelligence::{
    AlertCategory, AlertSeverity, DemandTrend, IntelligenceSnapshot, SmartAlert, StoreRiskProfile,
};
use crate::domain::task::{AutopilotTask, TaskId, TaskPriority, TaskSource, TaskType};

pub const TOP_STORE_TASK_LIMIT: usize = 10;
const RESTOCK_TASK_DAYS: i64 = 5;
const COLLECTION_TASK_BALANCE: i64 = 500;
const COLLECTION_ESCALATION_BALANCE: i64 = 2000;
const COMMUNICATION_TASK_DAYS: i64 = 21;
const COMMUNICATION_ESCALATION_DAYS: i64 = 45;
const CRITICAL_BOTTLENECK_SEVERITY: u32 = 70;
const PROMO_PUSH_GROWTH: f64 = -10.0;

/// Turns a snapshot into a task list ordered by priority. Equal priorities
/// keep generation order: alerts, store risks, top stores, delivery, brands.
pub fn generate_autopilot_tasks(
    snapshot: &IntelligenceSnapshot,
    now: DateTime<Utc>,
) -> Vec<AutopilotTask> {
    let mut tasks = Vec::new();

    for alert in &snapshot.alerts {
        tasks.push(task_from_alert(alert, now));
    }

    for profile in snapshot.store_risks.iter().filter(|profile| profile.risk_level.is_elevated()) {
        tasks.extend(tasks_from_risk(profile, now));
    }

    let targeted: HashSet<String> =
        tasks.iter().filter_map(|task| task.entity_id.clone()).collect();
    for store in snapshot.top_stores_to_check.iter().take(TOP_STORE_TASK_LIMIT) {
        if targeted.contains(&store.store_id) {
            continue;
        }
        let priority = if store.priority_score > 50.0 {
            TaskPriority::High
        } else if store.priority_score > 25.0 {
            TaskPriority::Medium
        } else {
            TaskPriority::Low
        };
        tasks.push(new_task(
            TaskType::StoreCheckin,
            priority,
            format!("Check in with {}", store.store_name),
            format!("Visit priority score {:.1}", store.priority_score),
            Some((&store.store_id, "store")),
            None,
            now,
        ));
    }

    if let Some(bottleneck) = snapshot.delivery_bottleneck.as_ref().filter(|b| b.is_bottleneck) {
        let priority = if bottleneck.severity > CRITICAL_BOTTLENECK_SEVERITY {
            TaskPriority::Critical
        } else {
            TaskPriority::High
        };
        tasks.push(new_task(
            TaskType::RouteOptimization,
            priority,
            "Rebalance delivery routes".to_string(),
            bottleneck.recommendation.clone(),
            None,
            None,
            now,
        ));
    }

    for forecast in &snapshot.brand_forecasts {
        if forecast.trend != DemandTrend::Declining || forecast.growth_rate >= PROMO_PUSH_GROWTH {
            continue;
        }
        tasks.push(new_task(
            TaskType::PromoPush,
            TaskPriority::Medium,
            format!("Push promo for {}", forecast.brand),
            format!(
                "Demand down {:.1}%, next period forecast {}",
                forecast.growth_rate.abs(),
                forecast.next_period_prediction
            ),
            Some((&forecast.brand, "brand")),
            Some(forecast.brand.clone()),
            now,
        ));
    }

    tasks.sort_by_key(|task| task.priority.rank());

    tracing::info!(
        event_name = "autopilot.tasks_generated",
        task_count = tasks.len(),
        alert_count = snapshot.alerts.len(),
        "autopilot tasks generated"
    );
    tasks
}

fn task_from_alert(alert: &SmartAlert, now: DateTime<Utc>) -> AutopilotTask {
    let task_type = task_type_for(alert.category);
    let priority = match alert.severity {
        AlertSeverity::Critical => TaskPriority::Critical,
        AlertSeverity::Warning => TaskPriority::High,
        AlertSeverity::Info => TaskPriority::Medium,
    };
    let brand = match (alert.category, &alert.entity_id) {
        (AlertCategory::Production, Some(brand)) => Some(brand.clone()),
        _ => None,
    };

    let mut task = new_task(
        task_type,
        priority,
        alert.title.clone(),
        alert.message.clone(),
        None,
        brand,
        now,
    );
    task.entity_id = alert.entity_id.clone();
    task.entity_type = alert.entity_type.clone();
    task
}

fn task_type_for(category: AlertCategory) -> TaskType {
    match category {
        AlertCategory::Inventory => TaskType::Restock,
        AlertCategory::Payment => TaskType::Collection,
        AlertCategory::Delivery => TaskType::DriverReview,
        AlertCategory::Production => TaskType::ProductionBatch,
        AlertCategory::Communication => TaskType::CommunicationFollowup,
        AlertCategory::Ambassador => TaskType::AmbassadorOutreach,
    }
}

fn tasks_from_risk(profile: &StoreRiskProfile, now: DateTime<Utc>) -> Vec<AutopilotTask> {
    let mut tasks = Vec::new();
    let entity = Some((&profile.store_id, "store"));

    if let Some(days) = profile.predicted_days_until_restock.filter(|days| *days <= RESTOCK_TASK_DAYS)
    {
        let priority = if days <= 2 { TaskPriority::Critical } else { TaskPriority::High };
        tasks.push(new_task(
            TaskType::Restock,
            priority,
            format!("Restock {}", profile.store_name),
            format!("Stock runs out in about {days} {}", if days == 1 { "day" } else { "days" }),
            entity,
            None,
            now,
        ));
    }

    if profile.unpaid_balance > Decimal::from(COLLECTION_TASK_BALANCE) {
        let priority = if profile.unpaid_balance > Decimal::from(COLLECTION_ESCALATION_BALANCE) {
            TaskPriority::High
        } else {
            TaskPriority::Medium
        };
        tasks.push(new_task(
            TaskType::Collection,
            priority,
            format!("Collect from {}", profile.store_name),
            format!("${} unpaid", profile.unpaid_balance),
            entity,
            None,
            now,
        ));
    }

    if let Some(gap) = profile.communication_gap.filter(|gap| *gap > COMMUNICATION_TASK_DAYS) {
        let priority = if gap > COMMUNICATION_ESCALATION_DAYS {
            TaskPriority::High
        } else {
            TaskPriority::Medium
        };
        tasks.push(new_task(
            TaskType::CommunicationFollowup,
            priority,
            format!("Reconnect with {}", profile.store_name),
            format!("No contact in {gap} days"),
            entity,
            None,
            now,
        ));
    }

    tasks
}

fn new_task(
    task_type: TaskType,
    priority: TaskPriority,
    title: String,
    description: String,
    entity: Option<(&String, &str)>,
    brand: Option<String>,
    now: DateTime<Utc>,
) -> AutopilotTask {
    AutopilotTask {
        id: TaskId(format!("task-{}", Uuid::new_v4())),
        task_type,
        floor: task_type.floor(),
        brand,
        priority,
        title,
        description,
        entity_id: entity.map(|(id, _)| id.clone()),
        entity_type: entity.map(|(_, kind)| kind.to_string()),
        due_date: (now + Duration::days(priority.due_offset_days())).date_naive(),
        created_at: now,
        source: TaskSource::IntelligenceCore,
        playbook: Some(task_type.playbook().to_string()),
    }
}
