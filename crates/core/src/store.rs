//! Operational data store contract.
//!
//! Records are JSON documents grouped into named collections. Every record
//! carries a string `id`. Query filters compare top-level fields only.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use thiserror::Error;

pub type Record = Map<String, Value>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Stores,
    Invoices,
    Drivers,
    Routes,
    Ambassadors,
    Inventory,
    ProductionBatches,
    WholesaleItems,
    Tasks,
    Messages,
    Notifications,
    ActivityLog,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stores => "stores",
            Self::Invoices => "invoices",
            Self::Drivers => "drivers",
            Self::Routes => "routes",
            Self::Ambassadors => "ambassadors",
            Self::Inventory => "inventory",
            Self::ProductionBatches => "production_batches",
            Self::WholesaleItems => "wholesale_items",
            Self::Tasks => "tasks",
            Self::Messages => "messages",
            Self::Notifications => "notifications",
            Self::ActivityLog => "activity_log",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq(Value),
    Neq(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    In(Vec<Value>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp) -> Self {
        Self { field: field.into(), op }
    }

    /// Missing fields never match, including for `Neq`.
    pub fn matches(&self, record: &Record) -> bool {
        let Some(actual) = record.get(&self.field).filter(|value| !value.is_null()) else {
            return false;
        };

        match &self.op {
            FilterOp::Eq(expected) => compare_values(actual, expected) == Some(Ordering::Equal),
            FilterOp::Neq(expected) => compare_values(actual, expected) != Some(Ordering::Equal),
            FilterOp::Gt(bound) => compare_values(actual, bound) == Some(Ordering::Greater),
            FilterOp::Gte(bound) => matches!(
                compare_values(actual, bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOp::Lt(bound) => compare_values(actual, bound) == Some(Ordering::Less),
            FilterOp::Lte(bound) => {
                matches!(compare_values(actual, bound), Some(Ordering::Less | Ordering::Equal))
            }
            FilterOp::In(candidates) => candidates
                .iter()
                .any(|candidate| compare_values(actual, candidate) == Some(Ordering::Equal)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordQuery {
    pub collection: Collection,
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl RecordQuery {
    pub fn new(collection: Collection) -> Self {
        Self { collection, filters: Vec::new(), order_by: None, limit: None }
    }

    pub fn filter(mut self, field: impl Into<String>, op: FilterOp) -> Self {
        self.filters.push(Filter::new(field, op));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some(OrderBy { field: field.into(), direction });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.filters.iter().all(|filter| filter.matches(record))
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store backend failure: {0}")]
    Backend(String),
    #[error("record decode failure: {0}")]
    Decode(String),
    #[error("store rejected write: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait OperationsStore: Send + Sync {
    async fn select(&self, query: &RecordQuery) -> Result<Vec<Record>, StoreError>;

    /// Inserts a record, assigning an `id` when absent. Returns the stored record.
    async fn insert(&self, collection: Collection, record: Record) -> Result<Record, StoreError>;

    /// Shallow-merges `patch` into every record whose id is in `ids`.
    /// Returns the number of records updated.
    async fn update(
        &self,
        collection: Collection,
        ids: &[String],
        patch: Record,
    ) -> Result<u64, StoreError>;
}

#[async_trait]
impl<T: OperationsStore + ?Sized> OperationsStore for Arc<T> {
    async fn select(&self, query: &RecordQuery) -> Result<Vec<Record>, StoreError> {
        (**self).select(query).await
    }

    async fn insert(&self, collection: Collection, record: Record) -> Result<Record, StoreError> {
        (**self).insert(collection, record).await
    }

    async fn update(
        &self,
        collection: Collection,
        ids: &[String],
        patch: Record,
    ) -> Result<u64, StoreError> {
        (**self).update(collection, ids, patch).await
    }
}

/// Evaluates a query over already-loaded records: filter, stable sort, limit.
/// Records missing the sort field sort last in either direction.
pub fn apply_query<'a>(
    query: &RecordQuery,
    records: impl IntoIterator<Item = &'a Record>,
) -> Vec<Record> {
    let mut selected: Vec<Record> =
        records.into_iter().filter(|record| query.matches(record)).cloned().collect();

    if let Some(order) = &query.order_by {
        selected.sort_by(|left, right| {
            let left = left.get(&order.field).filter(|value| !value.is_null());
            let right = right.get(&order.field).filter(|value| !value.is_null());
            match (left, right) {
                (Some(left), Some(right)) => {
                    let ordering = compare_values(left, right).unwrap_or(Ordering::Equal);
                    match order.direction {
                        SortDirection::Asc => ordering,
                        SortDirection::Desc => ordering.reverse(),
                    }
                }
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
    }

    if let Some(limit) = query.limit {
        selected.truncate(limit);
    }
    selected
}

/// Orders scalar JSON values of the same kind. Mixed kinds are incomparable.
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => left.as_f64()?.partial_cmp(&right.as_f64()?),
        (Value::String(left), Value::String(right)) => Some(left.cmp(right)),
        (Value::Bool(left), Value::Bool(right)) => Some(left.cmp(right)),
        _ => None,
    }
}

/// Money is stored as a JSON number so range filters compare numerically.
pub fn decimal_value(amount: Decimal) -> Value {
    amount.to_f64().and_then(Number::from_f64).map(Value::Number).unwrap_or(Value::Null)
}

pub fn record_str<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}

pub fn record_f64(record: &Record, field: &str) -> Option<f64> {
    record.get(field).and_then(Value::as_f64)
}

pub fn record_id(record: &Record) -> Option<&str> {
    record_str(record, "id")
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use serde_json::Value;
    use tokio::sync::RwLock;

    use super::{apply_query, Collection, OperationsStore, Record, RecordQuery, StoreError};

    /// Minimal in-process store for engine tests.
    #[derive(Default)]
    pub struct FakeStore {
        collections: RwLock<HashMap<Collection, Vec<Record>>>,
        next_id: RwLock<u64>,
        insert_budget: RwLock<Option<usize>>,
    }

    impl FakeStore {
        pub async fn with(collection: Collection, records: Vec<Value>) -> Self {
            let store = Self::default();
            for record in records {
                store.insert_json(collection, record).await;
            }
            store
        }

        pub async fn insert_json(&self, collection: Collection, record: Value) {
            if let Value::Object(record) = record {
                self.insert(collection, record).await.expect("seed insert");
            }
        }

        /// Lets `inserts` more inserts succeed, then fails the rest.
        pub async fn fail_inserts_after(&self, inserts: usize) {
            *self.insert_budget.write().await = Some(inserts);
        }

        pub async fn all(&self, collection: Collection) -> Vec<Record> {
            self.collections.read().await.get(&collection).cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl OperationsStore for FakeStore {
        async fn select(&self, query: &RecordQuery) -> Result<Vec<Record>, StoreError> {
            let collections = self.collections.read().await;
            Ok(apply_query(query, collections.get(&query.collection).into_iter().flatten()))
        }

        async fn insert(
            &self,
            collection: Collection,
            mut record: Record,
        ) -> Result<Record, StoreError> {
            if let Some(remaining) = self.insert_budget.write().await.as_mut() {
                if *remaining == 0 {
                    return Err(StoreError::Backend("disk I/O error".to_string()));
                }
                *remaining -= 1;
            }
            if !record.contains_key("id") {
                let mut next_id = self.next_id.write().await;
                *next_id += 1;
                record.insert("id".to_string(), Value::String(format!("fake-{next_id}")));
            }
            self.collections.write().await.entry(collection).or_default().push(record.clone());
            Ok(record)
        }

        async fn update(
            &self,
            collection: Collection,
            ids: &[String],
            patch: Record,
        ) -> Result<u64, StoreError> {
            let mut collections = self.collections.write().await;
            let mut updated = 0;
            for record in collections.entry(collection).or_default() {
                let matched = record
                    .get("id")
                    .and_then(Value::as_str)
                    .is_some_and(|id| ids.iter().any(|candidate| candidate == id));
                if matched {
                    for (key, value) in &patch {
                        record.insert(key.clone(), value.clone());
                    }
                    updated += 1;
                }
            }
            Ok(updated)
        }
    }

    /// Fails every call with a backend error.
    pub struct UnreachableStore;

    #[async_trait]
    impl OperationsStore for UnreachableStore {
        async fn select(&self, _query: &RecordQuery) -> Result<Vec<Record>, StoreError> {
            Err(StoreError::Backend("connection refused".to_string()))
        }

        async fn insert(
            &self,
            _collection: Collection,
            _record: Record,
        ) -> Result<Record, StoreError> {
            Err(StoreError::Backend("connection refused".to_string()))
        }

        async fn update(
            &self,
            _collection: Collection,
            _ids: &[String],
            _patch: Record,
        ) -> Result<u64, StoreError> {
            Err(StoreError::Backend("connection refused".to_string()))
        }
    }
}
