use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::task::Floor;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandId(pub String);

/// Closed set of operator intents understood by the command engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentId {
    QueryUnpaid,
    QueryLowStock,
    QueryInactiveStores,
    QueryDeliveries,
    QueryDrivers,
    QueryAmbassadors,
    QueryProduction,
    QueryTopStores,
    QueryFollowups,
    QueryWholesale,
    ShowHelp,
    Unknown,
}

impl IntentId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QueryUnpaid => "query_unpaid",
            Self::QueryLowStock => "query_low_stock",
            Self::QueryInactiveStores => "query_inactive_stores",
            Self::QueryDeliveries => "query_deliveries",
            Self::QueryDrivers => "query_drivers",
            Self::QueryAmbassadors => "query_ambassadors",
            Self::QueryProduction => "query_production",
            Self::QueryTopStores => "query_top_stores",
            Self::QueryFollowups => "query_followups",
            Self::QueryWholesale => "query_wholesale",
            Self::ShowHelp => "show_help",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "query_unpaid" => Some(Self::QueryUnpaid),
            "query_low_stock" => Some(Self::QueryLowStock),
            "query_inactive_stores" => Some(Self::QueryInactiveStores),
            "query_deliveries" => Some(Self::QueryDeliveries),
            "query_drivers" => Some(Self::QueryDrivers),
            "query_ambassadors" => Some(Self::QueryAmbassadors),
            "query_production" => Some(Self::QueryProduction),
            "query_top_stores" => Some(Self::QueryTopStores),
            "query_followups" => Some(Self::QueryFollowups),
            "query_wholesale" => Some(Self::QueryWholesale),
            "show_help" => Some(Self::ShowHelp),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

/// Verb detected in free text, independent of the resolved intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKeyword {
    Assign,
    Create,
    Update,
    Notify,
    Text,
    Route,
    Escalate,
    Export,
    Schedule,
    CreateRoute,
    FollowUp,
}

impl ActionKeyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assign => "assign",
            Self::Create => "create",
            Self::Update => "update",
            Self::Notify => "notify",
            Self::Text => "text",
            Self::Route => "route",
            Self::Escalate => "escalate",
            Self::Export => "export",
            Self::Schedule => "schedule",
            Self::CreateRoute => "create_route",
            Self::FollowUp => "follow_up",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedAction {
    pub id: String,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentDefinition {
    pub id: IntentId,
    pub name: String,
    pub keywords: Vec<String>,
    pub shortcuts: Vec<String>,
    pub floor: Floor,
    pub suggested_actions: Vec<SuggestedAction>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEntities {
    pub brand: Option<String>,
    pub amount: Option<Decimal>,
    pub days: Option<u32>,
    /// Start of the referenced period.
    pub date: Option<NaiveDate>,
    /// Inclusive end of the referenced period; equals `date` for single days.
    pub date_end: Option<NaiveDate>,
    pub status: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParsedCommand {
    pub original_text: String,
    pub intent: IntentId,
    pub action: Option<ActionKeyword>,
    pub confidence: f64,
    pub entities: CommandEntities,
    pub is_shortcut: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Store,
    Invoice,
    Driver,
    Route,
    Ambassador,
    Inventory,
    ProductionBatch,
    WholesaleItem,
}

impl ResultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Store => "store",
            Self::Invoice => "invoice",
            Self::Driver => "driver",
            Self::Route => "route",
            Self::Ambassador => "ambassador",
            Self::Inventory => "inventory",
            Self::ProductionBatch => "production_batch",
            Self::WholesaleItem => "wholesale_item",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub id: String,
    pub kind: ResultKind,
    pub title: String,
    pub subtitle: Option<String>,
    pub data: Map<String, Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Completed,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub id: CommandId,
    pub command: ParsedCommand,
    pub status: CommandStatus,
    pub summary: String,
    pub results: Vec<QueryResult>,
    pub suggested_actions: Vec<SuggestedAction>,
    pub error: Option<String>,
    pub executed_at: DateTime<Utc>,
}
