//! Deterministic demo dataset covering every queryable collection.
//!
//! Dates are laid out relative to the day the seed runs so `/unpaid`, `/low`
//! and the other shortcuts always have something to show.

use chrono::{Duration, NaiveDate};
use serde_json::{json, Value};

use grabba_core::store::{Collection, FilterOp, OperationsStore, RecordQuery, StoreError};

use crate::DbPool;

/// Every seeded id starts with this prefix.
pub const DEMO_ID_PREFIX: &str = "demo-";

pub struct DemoSeedDataset;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectionSeedInfo {
    pub collection: Collection,
    pub records: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub collections: Vec<CollectionSeedInfo>,
}

impl SeedResult {
    pub fn total_records(&self) -> usize {
        self.collections.iter().map(|info| info.records).sum()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

impl DemoSeedDataset {
    /// Records per collection, in insertion order.
    pub fn records(today: NaiveDate) -> Vec<(Collection, Vec<Value>)> {
        let day = |offset: i64| (today + Duration::days(offset)).format("%Y-%m-%d").to_string();

        vec![
            (
                Collection::Stores,
                vec![
                    json!({ "id": "demo-store-1", "name": "Corner Deli", "neighborhood": "Bronx",
                            "last_order_date": day(-9), "last_contact_date": day(-12),
                            "monthly_volume": 4200, "tags": ["vip"], "phone": "+17185550101" }),
                    json!({ "id": "demo-store-2", "name": "Bodega 9", "neighborhood": "Harlem",
                            "last_order_date": day(-3), "last_contact_date": day(-30),
                            "monthly_volume": 1800, "tags": [], "phone": "+12125550102" }),
                    json!({ "id": "demo-store-3", "name": "Lenox Mart", "neighborhood": "Harlem",
                            "last_order_date": day(-22), "last_contact_date": day(-50),
                            "monthly_volume": 950, "tags": [], "phone": "+12125550103" }),
                    json!({ "id": "demo-store-4", "name": "Fulton Smoke Shop", "neighborhood": "Brooklyn",
                            "last_order_date": day(-2), "last_contact_date": day(-4),
                            "monthly_volume": 3600, "tags": ["wholesale"], "phone": "+13475550104" }),
                    json!({ "id": "demo-store-5", "name": "Grand Concourse Market", "neighborhood": "Bronx",
                            "last_order_date": day(-35), "last_contact_date": day(-40),
                            "monthly_volume": 600, "tags": [], "phone": "+17185550105" }),
                    json!({ "id": "demo-store-6", "name": "Flatbush Express", "neighborhood": "Brooklyn",
                            "last_order_date": day(-6), "last_contact_date": day(-25),
                            "monthly_volume": 2100, "tags": [], "phone": "+13475550106" }),
                ],
            ),
            (
                Collection::Invoices,
                vec![
                    json!({ "id": "demo-inv-1", "store_id": "demo-store-1", "store_name": "Corner Deli",
                            "brand": "Grabba R", "amount": 5200.0, "status": "overdue", "due_date": day(-50) }),
                    json!({ "id": "demo-inv-2", "store_id": "demo-store-3", "store_name": "Lenox Mart",
                            "brand": "Hot Mama", "amount": 850.0, "status": "unpaid", "due_date": day(-20) }),
                    json!({ "id": "demo-inv-3", "store_id": "demo-store-5", "store_name": "Grand Concourse Market",
                            "brand": "Gas", "amount": 320.0, "status": "partial", "due_date": day(-35) }),
                    json!({ "id": "demo-inv-4", "store_id": "demo-store-4", "store_name": "Fulton Smoke Shop",
                            "brand": "Grabba R", "amount": 1400.0, "status": "paid", "due_date": day(-10) }),
                    json!({ "id": "demo-inv-5", "store_id": "demo-store-6", "store_name": "Flatbush Express",
                            "brand": "Black", "amount": 275.0, "status": "unpaid", "due_date": day(5) }),
                ],
            ),
            (
                Collection::Inventory,
                vec![
                    json!({ "id": "demo-stock-1", "store_id": "demo-store-2", "store_name": "Bodega 9",
                            "brand": "Gas", "tubes_left": 6, "avg_daily_consumption": 3.0, "days_until_empty": 2 }),
                    json!({ "id": "demo-stock-2", "store_id": "demo-store-6", "store_name": "Flatbush Express",
                            "brand": "Hot Mama", "tubes_left": 12, "avg_daily_consumption": 3.0, "days_until_empty": 4 }),
                    json!({ "id": "demo-stock-3", "store_id": "demo-store-4", "store_name": "Fulton Smoke Shop",
                            "brand": "Grabba R", "tubes_left": 40, "avg_daily_consumption": 4.0, "days_until_empty": 10 }),
                    json!({ "id": "demo-stock-4", "store_id": "demo-store-1", "store_name": "Corner Deli",
                            "brand": "Black", "tubes_left": 90, "avg_daily_consumption": 2.0, "days_until_empty": 45 }),
                ],
            ),
            (
                Collection::Drivers,
                vec![
                    json!({ "id": "demo-driver-1", "name": "Marcus", "status": "active", "on_time_rate": 0.92,
                            "deliveries_completed": 140, "complaints": 0, "phone": "+19175550201" }),
                    json!({ "id": "demo-driver-2", "name": "Tasha", "status": "active", "on_time_rate": 0.71,
                            "deliveries_completed": 64, "complaints": 2, "phone": "+19175550202" }),
                    json!({ "id": "demo-driver-3", "name": "Luis", "status": "inactive", "on_time_rate": 0.85,
                            "deliveries_completed": 30, "complaints": 0, "phone": "+19175550203" }),
                ],
            ),
            (
                Collection::Routes,
                vec![
                    json!({ "id": "demo-route-1", "name": "Bronx Loop", "driver_id": "demo-driver-1",
                            "driver_name": "Marcus", "stop_count": 8, "date": day(0), "status": "assigned" }),
                    json!({ "id": "demo-route-2", "name": "Harlem Run", "stop_count": 6, "date": day(0),
                            "status": "pending" }),
                    json!({ "id": "demo-route-3", "name": "Brooklyn Sweep", "driver_id": "demo-driver-2",
                            "driver_name": "Tasha", "stop_count": 11, "date": day(1), "status": "assigned" }),
                ],
            ),
            (
                Collection::Ambassadors,
                vec![
                    json!({ "id": "demo-amb-1", "name": "Dre", "last_activity_date": day(-18),
                            "stores_signed": 4, "status": "active" }),
                    json!({ "id": "demo-amb-2", "name": "Keisha", "last_activity_date": day(-2),
                            "stores_signed": 9, "status": "active" }),
                ],
            ),
            (
                Collection::ProductionBatches,
                vec![
                    json!({ "id": "demo-batch-1", "brand": "Gas", "quantity": 400, "status": "planned",
                            "scheduled_for": day(2) }),
                    json!({ "id": "demo-batch-2", "brand": "Hot Mama", "quantity": 250, "status": "in_progress",
                            "scheduled_for": day(0) }),
                    json!({ "id": "demo-batch-3", "brand": "Grabba R", "quantity": 500, "status": "completed",
                            "scheduled_for": day(-5) }),
                ],
            ),
            (
                Collection::WholesaleItems,
                vec![
                    json!({ "id": "demo-ws-1", "name": "Grabba R 24-pack", "brand": "Grabba R",
                            "price": 96.0, "quantity": 40, "status": "listed" }),
                    json!({ "id": "demo-ws-2", "name": "Hot Mama case", "brand": "Hot Mama",
                            "price": 120.0, "quantity": 15, "status": "draft" }),
                ],
            ),
        ]
    }

    pub async fn load<S>(store: &S, today: NaiveDate) -> Result<SeedResult, StoreError>
    where
        S: OperationsStore + ?Sized,
    {
        let mut collections = Vec::new();
        for (collection, records) in Self::records(today) {
            let count = records.len();
            for record in records {
                if let Value::Object(record) = record {
                    store.insert(collection, record).await?;
                }
            }
            collections.push(CollectionSeedInfo { collection, records: count });
        }

        tracing::info!(
            event_name = "db.seed_loaded",
            collections = collections.len(),
            "demo dataset loaded"
        );
        Ok(SeedResult { collections })
    }

    /// Checks every seeded id is readable back through `store`.
    pub async fn verify<S>(store: &S, today: NaiveDate) -> Result<VerificationResult, StoreError>
    where
        S: OperationsStore + ?Sized,
    {
        let mut checks = Vec::new();
        for (collection, records) in Self::records(today) {
            let ids: Vec<Value> =
                records.iter().filter_map(|record| record.get("id").cloned()).collect();
            let expected = ids.len();
            let query = RecordQuery::new(collection).filter("id", FilterOp::In(ids));
            let found = store.select(&query).await?.len();
            checks.push((collection.as_str(), found == expected));
        }

        let all_present = checks.iter().all(|(_, passed)| *passed);
        Ok(VerificationResult { all_present, checks })
    }

    /// Removes previously seeded rows so the dataset can be reloaded.
    pub async fn clean(pool: &DbPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM operational_record WHERE id LIKE ?1")
            .bind(format!("{DEMO_ID_PREFIX}%"))
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use grabba_core::store::Collection;

    use super::{DemoSeedDataset, DEMO_ID_PREFIX};
    use crate::InMemoryOperationsStore;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 14).expect("date")
    }

    #[test]
    fn every_seeded_id_carries_the_demo_prefix() {
        for (_, records) in DemoSeedDataset::records(today()) {
            for record in records {
                let id = record["id"].as_str().expect("id");
                assert!(id.starts_with(DEMO_ID_PREFIX), "{id}");
            }
        }
    }

    #[test]
    fn dates_are_relative_to_the_seed_day() {
        let records = DemoSeedDataset::records(today());
        let (_, invoices) = records
            .iter()
            .find(|(collection, _)| *collection == Collection::Invoices)
            .expect("invoices");
        assert_eq!(invoices[0]["due_date"], "2026-08-25");
    }

    #[tokio::test]
    async fn load_then_verify_in_memory() {
        let store = InMemoryOperationsStore::default();

        let seeded = DemoSeedDataset::load(&store, today()).await.expect("load");
        assert_eq!(seeded.collections.len(), 8);
        assert_eq!(seeded.total_records(), 28);
        assert_eq!(store.record_count(Collection::Stores).await, 6);

        let verification = DemoSeedDataset::verify(&store, today()).await.expect("verify");
        assert!(verification.all_present, "{:?}", verification.checks);
        assert!(DemoSeedDataset::load(&store, today()).await.is_err());
    }
}
