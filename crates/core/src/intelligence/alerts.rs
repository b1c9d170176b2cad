//! Threshold-based alert generation.
//!
//! One alert per qualifying signal. The combined list is stably sorted so
//! critical alerts lead and equal severities keep input order.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::intelligence::{AlertCategory, AlertId, AlertSeverity, SmartAlert};

pub const AMBASSADOR_INACTIVE_DAYS: i64 = 14;
pub const COMMUNICATION_GAP_DAYS: i64 = 21;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LowStockSignal {
    pub store_id: String,
    pub store_name: String,
    pub brand: Option<String>,
    pub tubes_left: f64,
    pub days_until_empty: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnpaidSignal {
    pub store_id: String,
    pub store_name: String,
    pub amount: Decimal,
    pub days_past_due: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AmbassadorSignal {
    pub ambassador_id: String,
    pub name: String,
    pub days_inactive: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriverDelaySignal {
    pub driver_id: String,
    pub name: String,
    pub late_deliveries: u32,
    pub total_deliveries: u32,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductionGapSignal {
    pub brand: String,
    pub demand: u32,
    pub scheduled: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommunicationGapSignal {
    pub store_id: String,
    pub store_name: String,
    pub days_since_contact: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertInputs {
    #[serde(default)]
    pub low_stock: Vec<LowStockSignal>,
    #[serde(default)]
    pub unpaid: Vec<UnpaidSignal>,
    #[serde(default)]
    pub inactive_ambassadors: Vec<AmbassadorSignal>,
    #[serde(default)]
    pub late_drivers: Vec<DriverDelaySignal>,
    #[serde(default)]
    pub production_gaps: Vec<ProductionGapSignal>,
    #[serde(default)]
    pub communication_gaps: Vec<CommunicationGapSignal>,
}

pub fn generate_smart_alerts(inputs: &AlertInputs, now: DateTime<Utc>) -> Vec<SmartAlert> {
    let mut alerts = Vec::new();

    for signal in &inputs.low_stock {
        let severity = if signal.days_until_empty <= 2 {
            AlertSeverity::Critical
        } else if signal.days_until_empty <= 5 {
            AlertSeverity::Warning
        } else {
            AlertSeverity::Info
        };
        let tubes = if signal.tubes_left == 1.0 { "tube" } else { "tubes" };
        let days = if signal.days_until_empty == 1 { "day" } else { "days" };
        let stock = match &signal.brand {
            Some(brand) => format!("{brand}: {} {tubes} left", signal.tubes_left),
            None => format!("{} {tubes} left", signal.tubes_left),
        };
        let mut low = alert(
            AlertCategory::Inventory,
            severity,
            format!("Low stock at {}", signal.store_name),
            format!("{stock}, about {} {days} until empty", signal.days_until_empty),
            Some((&signal.store_id, "store")),
            "create_restock_batch",
            now,
        );
        if let Some(brand) = &signal.brand {
            low.id.0.push('-');
            low.id.0.push_str(&id_segment(brand));
        }
        alerts.push(low);
    }

    for signal in &inputs.unpaid {
        let severity = if signal.days_past_due > 45 {
            AlertSeverity::Critical
        } else if signal.days_past_due > 30 {
            AlertSeverity::Warning
        } else {
            AlertSeverity::Info
        };
        alerts.push(alert(
            AlertCategory::Payment,
            severity,
            format!("Unpaid balance at {}", signal.store_name),
            format!("${} outstanding, {} days past due", signal.amount, signal.days_past_due),
            Some((&signal.store_id, "store")),
            "send_payment_reminder",
            now,
        ));
    }

    for signal in &inputs.inactive_ambassadors {
        if signal.days_inactive < AMBASSADOR_INACTIVE_DAYS {
            continue;
        }
        let severity =
            if signal.days_inactive >= 30 { AlertSeverity::Warning } else { AlertSeverity::Info };
        alerts.push(alert(
            AlertCategory::Ambassador,
            severity,
            format!("{} has gone quiet", signal.name),
            format!("No ambassador activity in {} days", signal.days_inactive),
            Some((&signal.ambassador_id, "ambassador")),
            "notify_ambassador",
            now,
        ));
    }

    for signal in &inputs.late_drivers {
        if signal.late_deliveries == 0 {
            continue;
        }
        let late_rate = if signal.total_deliveries == 0 {
            1.0
        } else {
            f64::from(signal.late_deliveries) / f64::from(signal.total_deliveries)
        };
        let severity = if late_rate > 0.3 {
            AlertSeverity::Critical
        } else if late_rate > 0.15 {
            AlertSeverity::Warning
        } else {
            AlertSeverity::Info
        };
        let mut message = format!(
            "{} of {} deliveries late ({:.0}%)",
            signal.late_deliveries,
            signal.total_deliveries,
            late_rate * 100.0
        );
        if let Some(note) = &signal.note {
            message.push_str(&format!(", {note}"));
        }
        alerts.push(alert(
            AlertCategory::Delivery,
            severity,
            format!("Late deliveries: {}", signal.name),
            message,
            Some((&signal.driver_id, "driver")),
            "notify_driver",
            now,
        ));
    }

    for signal in &inputs.production_gaps {
        let shortfall = signal.demand.saturating_sub(signal.scheduled);
        if shortfall == 0 {
            continue;
        }
        let ratio = f64::from(shortfall) / f64::from(signal.demand);
        let severity = if ratio >= 0.5 {
            AlertSeverity::Critical
        } else if ratio >= 0.2 {
            AlertSeverity::Warning
        } else {
            AlertSeverity::Info
        };
        alerts.push(alert(
            AlertCategory::Production,
            severity,
            format!("{} production short", signal.brand),
            format!(
                "{} units scheduled against {} demand, short {shortfall}",
                signal.scheduled, signal.demand
            ),
            Some((&signal.brand, "brand")),
            "create_batch",
            now,
        ));
    }

    for signal in &inputs.communication_gaps {
        if signal.days_since_contact < COMMUNICATION_GAP_DAYS {
            continue;
        }
        let severity =
            if signal.days_since_contact > 45 { AlertSeverity::Warning } else { AlertSeverity::Info };
        alerts.push(alert(
            AlertCategory::Communication,
            severity,
            format!("No contact with {}", signal.store_name),
            format!("Last contact {} days ago", signal.days_since_contact),
            Some((&signal.store_id, "store")),
            "text_store",
            now,
        ));
    }

    disambiguate_ids(&mut alerts);
    alerts.sort_by_key(|alert| alert.severity.rank());
    alerts
}

/// Repeated ids get a `-2`, `-3`, ... suffix in input order.
fn disambiguate_ids(alerts: &mut [SmartAlert]) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for alert in alerts {
        let occurrences = seen.entry(alert.id.0.clone()).or_insert(0);
        *occurrences += 1;
        if *occurrences > 1 {
            alert.id.0 = format!("{}-{occurrences}", alert.id.0);
        }
    }
}

fn id_segment(label: &str) -> String {
    label
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Ids are derived from category and entity (plus brand for stock alerts) so
/// reruns over the same input produce the same ids.
fn alert(
    category: AlertCategory,
    severity: AlertSeverity,
    title: String,
    message: String,
    entity: Option<(&String, &str)>,
    suggested_action: &str,
    now: DateTime<Utc>,
) -> SmartAlert {
    let id = match entity {
        Some((entity_id, _)) => format!("alert-{}-{entity_id}", category.as_str()),
        None => format!("alert-{}", category.as_str()),
    };
    SmartAlert {
        id: AlertId(id),
        category,
        severity,
        title,
        message,
        entity_id: entity.map(|(entity_id, _)| entity_id.clone()),
        entity_type: entity.map(|(_, entity_type)| entity_type.to_string()),
        action_required: severity != AlertSeverity::Info,
        suggested_action: Some(suggested_action.to_string()),
        created_at: now,
    }
}
