//! SQLite-backed `OperationsStore`.
//!
//! Every collection lives in one `operational_record` table as JSON text.
//! Filters are pushed down through `json_extract` and only match values of
//! the same JSON kind, so results agree with the in-memory store.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::{QueryBuilder, Row, Sqlite};
use uuid::Uuid;

use grabba_core::store::{
    Collection, Filter, FilterOp, OperationsStore, Record, RecordQuery, SortDirection, StoreError,
};

use crate::DbPool;

pub struct SqlOperationsStore {
    pool: DbPool,
}

impl SqlOperationsStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub async fn count(&self, collection: Collection) -> Result<i64, StoreError> {
        sqlx::query_scalar("SELECT COUNT(1) FROM operational_record WHERE collection = ?1")
            .bind(collection.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(backend)
    }
}

#[async_trait]
impl OperationsStore for SqlOperationsStore {
    async fn select(&self, query: &RecordQuery) -> Result<Vec<Record>, StoreError> {
        let mut builder =
            QueryBuilder::<Sqlite>::new("SELECT data FROM operational_record WHERE collection = ");
        builder.push_bind(query.collection.as_str());

        for filter in &query.filters {
            builder.push(" AND ");
            push_filter(&mut builder, filter)?;
        }

        builder.push(" ORDER BY ");
        if let Some(order) = &query.order_by {
            let path = json_path(&order.field)?;
            builder.push("json_extract(data, ");
            builder.push_bind(path.clone());
            builder.push(") IS NULL, json_extract(data, ");
            builder.push_bind(path);
            builder.push(match order.direction {
                SortDirection::Asc => ") ASC, ",
                SortDirection::Desc => ") DESC, ",
            });
        }
        builder.push("rowid");

        if let Some(limit) = query.limit {
            builder.push(" LIMIT ");
            builder.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let rows = builder.build().fetch_all(&self.pool).await.map_err(backend)?;
        rows.iter()
            .map(|row| {
                let raw: String = row.try_get("data").map_err(|error| decode(error.to_string()))?;
                decode_record(&raw)
            })
            .collect()
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
        let data = encode_record(&record)?;
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO operational_record (collection, id, data, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
        )
        .bind(collection.as_str())
        .bind(&id)
        .bind(data)
        .bind(&now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(record),
            Err(sqlx::Error::Database(error)) if error.is_unique_violation() => Err(
                StoreError::Rejected(format!("{} record `{id}` already exists", collection.as_str())),
            ),
            Err(error) => Err(backend(error)),
        }
    }

    async fn update(
        &self,
        collection: Collection,
        ids: &[String],
        patch: Record,
    ) -> Result<u64, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.map_err(backend)?;

        let mut select = QueryBuilder::<Sqlite>::new(
            "SELECT id, data FROM operational_record WHERE collection = ",
        );
        select.push_bind(collection.as_str());
        select.push(" AND id IN (");
        let mut separated = select.separated(", ");
        for id in ids {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(")");
        let rows = select.build().fetch_all(&mut *tx).await.map_err(backend)?;

        let now = Utc::now().to_rfc3339();
        let mut updated = 0;
        for row in rows {
            let id: String = row.try_get("id").map_err(|error| decode(error.to_string()))?;
            let raw: String = row.try_get("data").map_err(|error| decode(error.to_string()))?;
            let mut record = decode_record(&raw)?;
            merge_patch(&mut record, &patch);

            let result = sqlx::query(
                "UPDATE operational_record SET data = ?1, updated_at = ?2
                 WHERE collection = ?3 AND id = ?4",
            )
            .bind(encode_record(&record)?)
            .bind(&now)
            .bind(collection.as_str())
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
            updated += result.rows_affected();
        }

        tx.commit().await.map_err(backend)?;

        tracing::debug!(
            event_name = "db.records_updated",
            collection = collection.as_str(),
            requested = ids.len(),
            updated,
            "records updated"
        );
        Ok(updated)
    }
}

/// Shallow merge; the record id is never overwritten.
pub(crate) fn merge_patch(record: &mut Record, patch: &Record) {
    for (key, value) in patch {
        if key != "id" {
            record.insert(key.clone(), value.clone());
        }
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &Filter) -> Result<(), StoreError> {
    let path = json_path(&filter.field)?;
    match &filter.op {
        FilterOp::Eq(value) => push_comparison(builder, &path, "=", value),
        FilterOp::Neq(value) => {
            builder.push("(json_type(data, ");
            builder.push_bind(path.clone());
            builder.push(") <> 'null' AND NOT ");
            push_comparison(builder, &path, "=", value);
            builder.push(")");
        }
        FilterOp::Gt(value) => push_comparison(builder, &path, ">", value),
        FilterOp::Gte(value) => push_comparison(builder, &path, ">=", value),
        FilterOp::Lt(value) => push_comparison(builder, &path, "<", value),
        FilterOp::Lte(value) => push_comparison(builder, &path, "<=", value),
        FilterOp::In(candidates) if candidates.is_empty() => {
            builder.push("0");
        }
        FilterOp::In(candidates) => {
            builder.push("(");
            for (index, candidate) in candidates.iter().enumerate() {
                if index > 0 {
                    builder.push(" OR ");
                }
                push_comparison(builder, &path, "=", candidate);
            }
            builder.push(")");
        }
    }
    Ok(())
}

/// Emits `(<kind check> AND json_extract(data, path) <op> ?)`. Values that are
/// not scalars can never compare equal, so they emit a constant false.
fn push_comparison(builder: &mut QueryBuilder<'_, Sqlite>, path: &str, op: &str, value: &Value) {
    let kinds = match value {
        Value::Number(_) => "('integer', 'real')",
        Value::String(_) => "('text')",
        Value::Bool(_) => "('true', 'false')",
        Value::Null | Value::Array(_) | Value::Object(_) => {
            builder.push("0");
            return;
        }
    };

    builder.push("(json_type(data, ");
    builder.push_bind(path.to_string());
    builder.push(format!(") IN {kinds} AND json_extract(data, "));
    builder.push_bind(path.to_string());
    builder.push(format!(") {op} "));
    match value {
        Value::Number(number) => {
            builder.push_bind(number.as_f64().unwrap_or(f64::NAN));
        }
        Value::String(text) => {
            builder.push_bind(text.clone());
        }
        Value::Bool(flag) => {
            builder.push_bind(i64::from(*flag));
        }
        Value::Null | Value::Array(_) | Value::Object(_) => {}
    }
    builder.push(")");
}

fn json_path(field: &str) -> Result<String, StoreError> {
    let valid = !field.is_empty()
        && field.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if !valid {
        return Err(StoreError::Rejected(format!("unsupported field name `{field}`")));
    }
    Ok(format!("$.{field}"))
}

fn encode_record(record: &Record) -> Result<String, StoreError> {
    serde_json::to_string(record).map_err(|error| decode(error.to_string()))
}

fn decode_record(raw: &str) -> Result<Record, StoreError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(_) => Err(decode("stored record is not a JSON object".to_string())),
        Err(error) => Err(decode(error.to_string())),
    }
}

fn backend(error: sqlx::Error) -> StoreError {
    StoreError::Backend(error.to_string())
}

fn decode(message: String) -> StoreError {
    StoreError::Decode(message)
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use grabba_core::store::{
        Collection, FilterOp, OperationsStore, Record, RecordQuery, SortDirection, StoreError,
    };

    use super::SqlOperationsStore;
    use crate::{connect_with_settings, migrations};

    async fn store() -> SqlOperationsStore {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlOperationsStore::new(pool)
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().expect("object literal")
    }

    fn ids(records: &[Record]) -> Vec<String> {
        records
            .iter()
            .map(|record| record["id"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    async fn seed_invoices(store: &SqlOperationsStore) {
        let rows = [
            json!({ "id": "inv-1", "amount": 450.0, "status": "unpaid", "due_date": "2026-09-30" }),
            json!({ "id": "inv-2", "amount": 1200, "status": "overdue", "due_date": "2026-08-01" }),
            json!({ "id": "inv-3", "amount": 90, "status": "paid", "due_date": "2026-10-01" }),
            json!({ "id": "inv-4", "amount": "n/a", "status": "unpaid" }),
            json!({ "id": "inv-5", "status": "unpaid", "due_date": "2026-10-10" }),
        ];
        for row in rows {
            store.insert(Collection::Invoices, record(row)).await.expect("insert");
        }
    }

    #[tokio::test]
    async fn insert_assigns_ids_and_select_returns_insertion_order() {
        let store = store().await;
        let stored = store
            .insert(Collection::Stores, record(json!({ "name": "Corner Deli" })))
            .await
            .expect("insert");
        store
            .insert(Collection::Stores, record(json!({ "id": "s2", "name": "Bodega 9" })))
            .await
            .expect("insert");

        let generated = stored["id"].as_str().expect("generated id").to_string();
        let rows = store.select(&RecordQuery::new(Collection::Stores)).await.expect("select");
        assert_eq!(ids(&rows), [generated, "s2".to_string()]);
        assert_eq!(store.count(Collection::Stores).await.expect("count"), 2);
        assert_eq!(store.count(Collection::Invoices).await.expect("count"), 0);
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let store = store().await;
        store.insert(Collection::Stores, record(json!({ "id": "s1" }))).await.expect("insert");

        let error = store
            .insert(Collection::Stores, record(json!({ "id": "s1" })))
            .await
            .expect_err("duplicate");
        assert!(matches!(error, StoreError::Rejected(_)));

        // Ids are scoped per collection.
        store.insert(Collection::Drivers, record(json!({ "id": "s1" }))).await.expect("insert");
    }

    #[tokio::test]
    async fn filters_match_only_values_of_the_same_kind() {
        let store = store().await;
        seed_invoices(&store).await;

        let over_300 = RecordQuery::new(Collection::Invoices)
            .filter("amount", FilterOp::Gt(json!(300)))
            .order_by("amount", SortDirection::Desc);
        assert_eq!(ids(&store.select(&over_300).await.expect("select")), ["inv-2", "inv-1"]);

        let open = RecordQuery::new(Collection::Invoices)
            .filter("status", FilterOp::In(vec![json!("unpaid"), json!("overdue")]))
            .filter("due_date", FilterOp::Lte(json!("2026-10-01")));
        assert_eq!(ids(&store.select(&open).await.expect("select")), ["inv-1", "inv-2"]);

        let not_paid = RecordQuery::new(Collection::Invoices)
            .filter("status", FilterOp::Neq(json!("paid")));
        assert_eq!(
            ids(&store.select(&not_paid).await.expect("select")),
            ["inv-1", "inv-2", "inv-4", "inv-5"]
        );

        let none = RecordQuery::new(Collection::Invoices).filter("status", FilterOp::In(vec![]));
        assert!(store.select(&none).await.expect("select").is_empty());
    }

    #[tokio::test]
    async fn missing_sort_fields_sort_last_and_limit_applies() {
        let store = store().await;
        seed_invoices(&store).await;

        let by_due = RecordQuery::new(Collection::Invoices)
            .filter("status", FilterOp::Eq(json!("unpaid")))
            .order_by("due_date", SortDirection::Asc);
        assert_eq!(ids(&store.select(&by_due).await.expect("select")), ["inv-1", "inv-5", "inv-4"]);

        let first = store.select(&by_due.limit(1)).await.expect("select");
        assert_eq!(ids(&first), ["inv-1"]);
    }

    #[tokio::test]
    async fn unsafe_field_names_are_rejected() {
        let store = store().await;
        let query = RecordQuery::new(Collection::Stores)
            .filter("name') OR 1=1 --", FilterOp::Eq(json!("x")));

        let error = store.select(&query).await.expect_err("rejected");
        assert!(matches!(error, StoreError::Rejected(_)));
    }

    #[tokio::test]
    async fn update_merges_shallowly_and_counts_matches() {
        let store = store().await;
        seed_invoices(&store).await;

        let patch = record(json!({ "id": "hijack", "status": "paid", "paid_at": "2026-10-14" }));
        let updated = store
            .update(
                Collection::Invoices,
                &["inv-1".to_string(), "inv-2".to_string(), "missing".to_string()],
                patch,
            )
            .await
            .expect("update");
        assert_eq!(updated, 2);

        let paid = RecordQuery::new(Collection::Invoices)
            .filter("status", FilterOp::Eq(json!("paid")))
            .order_by("amount", SortDirection::Asc);
        let rows = store.select(&paid).await.expect("select");
        assert_eq!(ids(&rows), ["inv-3", "inv-1", "inv-2"]);
        assert_eq!(rows[1]["paid_at"], "2026-10-14");
        assert_eq!(rows[1]["amount"], 450.0);

        let nothing = store
            .update(Collection::Invoices, &[], record(json!({ "status": "void" })))
            .await
            .expect("update");
        assert_eq!(nothing, 0);
    }
}
