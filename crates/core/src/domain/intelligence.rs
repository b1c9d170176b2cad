use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    Inventory,
    Payment,
    Delivery,
    Production,
    Communication,
    Ambassador,
}

impl AlertCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inventory => "inventory",
            Self::Payment => "payment",
            Self::Delivery => "delivery",
            Self::Production => "production",
            Self::Communication => "communication",
            Self::Ambassador => "ambassador",
        }
    }
}

/// Declaration order is the sort order: critical first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Critical,
    Warning,
    Info,
}

impl AlertSeverity {
    pub fn rank(&self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::Warning => 1,
            Self::Info => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SmartAlert {
    pub id: AlertId,
    pub category: AlertCategory,
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,
    pub entity_id: Option<String>,
    pub entity_type: Option<String>,
    pub action_required: bool,
    pub suggested_action: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: u32) -> Self {
        if score >= 70 {
            Self::Critical
        } else if score >= 50 {
            Self::High
        } else if score >= 30 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn is_elevated(&self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoreRiskProfile {
    pub store_id: String,
    pub store_name: String,
    pub risk_score: u32,
    pub risk_level: RiskLevel,
    pub factors: Vec<String>,
    pub predicted_days_until_restock: Option<i64>,
    pub unpaid_balance: Decimal,
    pub days_since_last_order: Option<i64>,
    pub communication_gap: Option<i64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandTrend {
    Rising,
    Stable,
    Declining,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BrandDemandForecast {
    pub brand: String,
    pub current_period: f64,
    pub next_period_prediction: f64,
    pub growth_rate: f64,
    pub trend: DemandTrend,
    pub confidence: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeliveryBottleneck {
    pub is_bottleneck: bool,
    pub capacity_ratio: f64,
    pub severity: u32,
    pub recommendation: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    Sales,
    Geography,
    Financial,
    Operations,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BusinessInsight {
    pub id: String,
    pub category: InsightCategory,
    pub title: String,
    pub description: String,
    pub confidence: f64,
    pub data_points: u64,
}

/// Store flagged for a routine visit, ranked by the snapshot supplier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopStore {
    pub store_id: String,
    pub store_name: String,
    pub priority_score: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetrics {
    pub active_stores: u64,
    pub total_unpaid: Decimal,
    pub pending_deliveries: u64,
    pub active_drivers: u64,
    pub delivery_completion_rate: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntelligenceSnapshot {
    pub alerts: Vec<SmartAlert>,
    pub store_risks: Vec<StoreRiskProfile>,
    pub brand_forecasts: Vec<BrandDemandForecast>,
    pub insights: Vec<BusinessInsight>,
    pub delivery_bottleneck: Option<DeliveryBottleneck>,
    pub top_stores_to_check: Vec<TopStore>,
    pub metrics: SnapshotMetrics,
    pub generated_at: DateTime<Utc>,
}
