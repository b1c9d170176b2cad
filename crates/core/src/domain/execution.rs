use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::command::QueryResult;

/// Side-effecting operations the execution engine knows how to perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutableAction {
    AssignDriver,
    CreateProductionBatch,
    SendText,
    SendRouteToDriver,
    UpdateInvoiceStatus,
    MarkStoreTag,
    AddFollowupTask,
    PushWholesaleItem,
    ExportData,
    SendNotification,
}

impl ExecutableAction {
    pub const ALL: [ExecutableAction; 10] = [
        ExecutableAction::AssignDriver,
        ExecutableAction::CreateProductionBatch,
        ExecutableAction::SendText,
        ExecutableAction::SendRouteToDriver,
        ExecutableAction::UpdateInvoiceStatus,
        ExecutableAction::MarkStoreTag,
        ExecutableAction::AddFollowupTask,
        ExecutableAction::PushWholesaleItem,
        ExecutableAction::ExportData,
        ExecutableAction::SendNotification,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssignDriver => "assign_driver",
            Self::CreateProductionBatch => "create_production_batch",
            Self::SendText => "send_text",
            Self::SendRouteToDriver => "send_route_to_driver",
            Self::UpdateInvoiceStatus => "update_invoice_status",
            Self::MarkStoreTag => "mark_store_tag",
            Self::AddFollowupTask => "add_followup_task",
            Self::PushWholesaleItem => "push_wholesale_item",
            Self::ExportData => "export_data",
            Self::SendNotification => "send_notification",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|action| action.as_str() == normalized)
    }
}

/// Loosely-typed parameter bag; each action validates the fields it needs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionParams {
    #[serde(default)]
    pub entity_ids: Vec<String>,
    #[serde(default)]
    pub results: Vec<QueryResult>,
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
    pub requested_by: Option<String>,
}

impl ActionParams {
    /// Explicit ids win; otherwise ids are lifted from the supplied result set.
    pub fn target_ids(&self) -> Vec<String> {
        if !self.entity_ids.is_empty() {
            return self.entity_ids.clone();
        }
        self.results.iter().map(|result| result.id.clone()).collect()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub message: String,
    pub affected_count: Option<u64>,
    pub data: Option<Value>,
    pub error: Option<String>,
}

impl ExecutionResult {
    pub fn succeeded(message: impl Into<String>, affected_count: u64) -> Self {
        Self {
            success: true,
            message: message.into(),
            affected_count: Some(affected_count),
            data: None,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>, error: Option<String>) -> Self {
        Self { success: false, message: message.into(), affected_count: None, data: None, error }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}
