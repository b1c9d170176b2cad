use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use grabba_core::store::{
    apply_query, record_id, Collection, OperationsStore, Record, RecordQuery, StoreError,
};

use super::operations::merge_patch;

/// Process-local store with the same query semantics as the SQLite store.
#[derive(Default)]
pub struct InMemoryOperationsStore {
    collections: RwLock<HashMap<Collection, Vec<Record>>>,
}

impl InMemoryOperationsStore {
    pub async fn record_count(&self, collection: Collection) -> usize {
        self.collections.read().await.get(&collection).map_or(0, Vec::len)
    }
}

#[async_trait]
impl OperationsStore for InMemoryOperationsStore {
    async fn select(&self, query: &RecordQuery) -> Result<Vec<Record>, StoreError> {
        let collections = self.collections.read().await;
        Ok(apply_query(query, collections.get(&query.collection).into_iter().flatten()))
    }

    async fn insert(&self, collection: Collection, mut record: Record) -> Result<Record, StoreError> {
        let id = match record.get("id") {
            Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
            None | Some(Value::Null) => {
                let id = Uuid::new_v4().to_string();
                record.insert("id".to_string(), Value::String(id.clone()));
                id
            }
            Some(_) => {
                return Err(StoreError::Rejected("record id must be a non-empty string".to_string()))
            }
        };

        let mut collections = self.collections.write().await;
        let records = collections.entry(collection).or_default();
        if records.iter().any(|existing| record_id(existing) == Some(id.as_str())) {
            return Err(StoreError::Rejected(format!(
                "{} record `{id}` already exists",
                collection.as_str()
            )));
        }
        records.push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        collection: Collection,
        ids: &[String],
        patch: Record,
    ) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(records) = collections.get_mut(&collection) else {
            return Ok(0);
        };

        let mut updated = 0;
        for record in records.iter_mut() {
            let matched =
                record_id(record).is_some_and(|id| ids.iter().any(|candidate| candidate == id));
            if matched {
                merge_patch(record, &patch);
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use grabba_core::store::{
        Collection, FilterOp, OperationsStore, Record, RecordQuery, SortDirection, StoreError,
    };

    use super::InMemoryOperationsStore;

    fn record(value: Value) -> Record {
        value.as_object().cloned().expect("object literal")
    }

    #[tokio::test]
    async fn insert_select_update_round() {
        let store = InMemoryOperationsStore::default();
        for (id, volume) in [("s1", 900), ("s2", 4200), ("s3", 1800)] {
            store
                .insert(Collection::Stores, record(json!({ "id": id, "monthly_volume": volume })))
                .await
                .expect("insert");
        }

        let top = RecordQuery::new(Collection::Stores)
            .filter("monthly_volume", FilterOp::Gte(json!(1000)))
            .order_by("monthly_volume", SortDirection::Desc);
        let rows = store.select(&top).await.expect("select");
        assert_eq!(rows[0]["id"], "s2");
        assert_eq!(rows[1]["id"], "s3");
        assert_eq!(rows.len(), 2);

        let updated = store
            .update(
                Collection::Stores,
                &["s1".to_string(), "s3".to_string()],
                record(json!({ "id": "other", "tags": ["vip"] })),
            )
            .await
            .expect("update");
        assert_eq!(updated, 2);

        let tagged = store.select(&RecordQuery::new(Collection::Stores)).await.expect("select");
        assert_eq!(tagged[0]["id"], "s1");
        assert_eq!(tagged[0]["tags"], json!(["vip"]));
        assert!(tagged[1].get("tags").is_none());
    }

    #[tokio::test]
    async fn generated_ids_and_duplicates() {
        let store = InMemoryOperationsStore::default();
        let stored = store.insert(Collection::Tasks, Record::new()).await.expect("insert");
        assert!(stored["id"].as_str().is_some_and(|id| !id.is_empty()));

        store.insert(Collection::Tasks, record(json!({ "id": "t1" }))).await.expect("insert");
        let error =
            store.insert(Collection::Tasks, record(json!({ "id": "t1" }))).await.expect_err("dup");
        assert!(matches!(error, StoreError::Rejected(_)));
        assert_eq!(store.record_count(Collection::Tasks).await, 2);
        assert_eq!(
            store.update(Collection::Drivers, &["t1".to_string()], Record::new()).await,
            Ok(0)
        );
    }
}
