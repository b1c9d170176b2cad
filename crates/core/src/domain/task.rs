use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

/// Organizational routing bucket. Serialized as its floor number (0-8).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Floor {
    CommandCenter,
    StoresInventory,
    DeliveryRoutes,
    FinanceCollections,
    Production,
    Communications,
    Ambassadors,
    Wholesale,
    MarketingGrowth,
}

impl Floor {
    pub const ALL: [Floor; 9] = [
        Floor::CommandCenter,
        Floor::StoresInventory,
        Floor::DeliveryRoutes,
        Floor::FinanceCollections,
        Floor::Production,
        Floor::Communications,
        Floor::Ambassadors,
        Floor::Wholesale,
        Floor::MarketingGrowth,
    ];

    pub fn number(&self) -> u8 {
        match self {
            Self::CommandCenter => 0,
            Self::StoresInventory => 1,
            Self::DeliveryRoutes => 2,
            Self::FinanceCollections => 3,
            Self::Production => 4,
            Self::Communications => 5,
            Self::Ambassadors => 6,
            Self::Wholesale => 7,
            Self::MarketingGrowth => 8,
        }
    }

    pub fn from_number(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::CommandCenter => "Command Center",
            Self::StoresInventory => "Stores & Inventory",
            Self::DeliveryRoutes => "Delivery & Routes",
            Self::FinanceCollections => "Finance & Collections",
            Self::Production => "Production",
            Self::Communications => "Communications",
            Self::Ambassadors => "Ambassadors",
            Self::Wholesale => "Wholesale",
            Self::MarketingGrowth => "Marketing & Growth",
        }
    }
}

impl From<Floor> for u8 {
    fn from(floor: Floor) -> Self {
        floor.number()
    }
}

impl TryFrom<u8> for Floor {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_number(value).ok_or_else(|| format!("floor {value} is outside 0..=8"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Restock,
    Collection,
    CommunicationFollowup,
    StoreCheckin,
    RouteOptimization,
    DriverReview,
    ProductionBatch,
    AmbassadorOutreach,
    PromoPush,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Restock => "restock",
            Self::Collection => "collection",
            Self::CommunicationFollowup => "communication_followup",
            Self::StoreCheckin => "store_checkin",
            Self::RouteOptimization => "route_optimization",
            Self::DriverReview => "driver_review",
            Self::ProductionBatch => "production_batch",
            Self::AmbassadorOutreach => "ambassador_outreach",
            Self::PromoPush => "promo_push",
        }
    }

    /// Fixed task-type to floor routing table.
    pub fn floor(&self) -> Floor {
        match self {
            Self::Restock | Self::StoreCheckin => Floor::StoresInventory,
            Self::RouteOptimization | Self::DriverReview => Floor::DeliveryRoutes,
            Self::Collection => Floor::FinanceCollections,
            Self::ProductionBatch => Floor::Production,
            Self::CommunicationFollowup => Floor::Communications,
            Self::AmbassadorOutreach => Floor::Ambassadors,
            Self::PromoPush => Floor::MarketingGrowth,
        }
    }

    pub fn playbook(&self) -> &'static str {
        match self {
            Self::Restock => "playbook.inventory.restock",
            Self::Collection => "playbook.finance.collections",
            Self::CommunicationFollowup => "playbook.comms.reengage",
            Self::StoreCheckin => "playbook.stores.checkin",
            Self::RouteOptimization => "playbook.delivery.rebalance_routes",
            Self::DriverReview => "playbook.delivery.driver_review",
            Self::ProductionBatch => "playbook.production.batch_plan",
            Self::AmbassadorOutreach => "playbook.ambassadors.reactivate",
            Self::PromoPush => "playbook.growth.promo_push",
        }
    }
}

/// Declaration order is the sort order: critical first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Critical,
    High,
    Medium,
    Low,
}

impl TaskPriority {
    pub fn rank(&self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Days from creation until the task is due.
    pub fn due_offset_days(&self) -> i64 {
        match self {
            Self::Critical => 1,
            Self::High => 2,
            Self::Medium => 5,
            Self::Low => 7,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSource {
    IntelligenceCore,
    DailyReport,
    Manual,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutopilotTask {
    pub id: TaskId,
    pub task_type: TaskType,
    pub floor: Floor,
    pub brand: Option<String>,
    pub priority: TaskPriority,
    pub title: String,
    pub description: String,
    pub entity_id: Option<String>,
    pub entity_type: Option<String>,
    pub due_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub source: TaskSource,
    pub playbook: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{Floor, TaskPriority, TaskType};

    #[test]
    fn floor_serializes_as_its_number() {
        let encoded = serde_json::to_string(&Floor::FinanceCollections).expect("serialize");
        assert_eq!(encoded, "3");

        let decoded: Floor = serde_json::from_str("8").expect("deserialize");
        assert_eq!(decoded, Floor::MarketingGrowth);
        assert!(serde_json::from_str::<Floor>("9").is_err());
    }

    #[test]
    fn every_task_type_routes_to_a_known_floor() {
        let types = [
            TaskType::Restock,
            TaskType::Collection,
            TaskType::CommunicationFollowup,
            TaskType::StoreCheckin,
            TaskType::RouteOptimization,
            TaskType::DriverReview,
            TaskType::ProductionBatch,
            TaskType::AmbassadorOutreach,
            TaskType::PromoPush,
        ];

        for task_type in types {
            let floor = task_type.floor();
            assert_eq!(Floor::from_number(floor.number()), Some(floor));
        }
    }

    #[test]
    fn priority_ordering_puts_critical_first() {
        let mut priorities =
            vec![TaskPriority::Low, TaskPriority::Critical, TaskPriority::Medium, TaskPriority::High];
        priorities.sort_by_key(TaskPriority::rank);
        assert_eq!(
            priorities,
            vec![TaskPriority::Critical, TaskPriority::High, TaskPriority::Medium, TaskPriority::Low]
        );
    }
}
