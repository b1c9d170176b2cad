//! Execution of operator actions against the operations store.
//!
//! Every call returns an `ExecutionResult`. Parameter validation failures and
//! store failures are folded into failed results and never propagated. Each
//! execution also emits one audit event.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, TracingAuditSink};
use crate::domain::command::QueryResult;
use crate::domain::execution::{ActionParams, ExecutableAction, ExecutionResult};
use crate::errors::{ApplicationError, DomainError};
use crate::store::{
    decimal_value, record_id, Collection, FilterOp, OperationsStore, Record, RecordQuery,
};

pub const INVOICE_STATUSES: &[&str] = &["paid", "unpaid", "partial", "overdue", "void"];

const DEFAULT_ACTOR: &str = "operator";
const FOLLOWUP_DUE_DAYS: i64 = 2;
const BATCH_LEAD_DAYS: i64 = 1;

pub struct ExecutionEngine<S> {
    store: S,
    audit: Arc<dyn AuditSink>,
}

impl<S: OperationsStore> ExecutionEngine<S> {
    pub fn new(store: S) -> Self {
        Self::with_audit_sink(store, Arc::new(TracingAuditSink))
    }

    pub fn with_audit_sink(store: S, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, audit }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolves `name` to an executable action; unknown names fail cleanly.
    pub async fn execute_named(&self, name: &str, params: &ActionParams) -> ExecutionResult {
        match ExecutableAction::parse(name) {
            Some(action) => self.execute_action(action, params).await,
            None => {
                let error = DomainError::UnsupportedAction(name.trim().to_string());
                self.audit.emit(
                    AuditEvent::new(
                        Uuid::new_v4().to_string(),
                        "execution.unsupported_action",
                        AuditCategory::Execution,
                        actor(params),
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("action", name.trim()),
                );
                ExecutionResult::failed(format!("Unknown action: {}", name.trim()), Some(error.to_string()))
            }
        }
    }

    pub async fn execute_action(
        &self,
        action: ExecutableAction,
        params: &ActionParams,
    ) -> ExecutionResult {
        self.execute_action_at(action, params, Utc::now()).await
    }

    pub async fn execute_action_at(
        &self,
        action: ExecutableAction,
        params: &ActionParams,
        now: DateTime<Utc>,
    ) -> ExecutionResult {
        let correlation_id = Uuid::new_v4().to_string();
        let outcome = self.dispatch(action, params, now).await;

        let (result, audit_outcome) = match outcome {
            Ok(result) => (result, AuditOutcome::Success),
            Err(ApplicationError::Domain(error)) => {
                tracing::info!(
                    event_name = "execution.action_rejected",
                    correlation_id = %correlation_id,
                    action = action.as_str(),
                    error = %error,
                    "action rejected by validation"
                );
                (ExecutionResult::failed(rejection_message(&error), Some(error.to_string())), AuditOutcome::Rejected)
            }
            Err(error) => {
                tracing::warn!(
                    event_name = "execution.action_failed",
                    correlation_id = %correlation_id,
                    action = action.as_str(),
                    error = %error,
                    "action failed against the store"
                );
                let mut failed = ExecutionResult::failed(
                    format!("Could not complete {}", action.as_str().replace('_', " ")),
                    Some(error.to_string()),
                );
                // Messages already queued stay queued; report how many.
                if let ApplicationError::PartialDelivery { queued, .. } = error {
                    failed.affected_count = Some(queued);
                }
                (failed, AuditOutcome::Failed)
            }
        };

        if result.success {
            self.record_activity(action, params, &result, now).await;
        }

        let mut event = AuditEvent::new(
            correlation_id,
            format!("execution.{}", action.as_str()),
            AuditCategory::Execution,
            actor(params),
            audit_outcome,
        )
        .with_metadata("action", action.as_str())
        .with_metadata("target_count", params.target_ids().len().to_string());
        if let Some(count) = result.affected_count {
            event = event.with_metadata("affected_count", count.to_string());
        }
        if let Some(error) = &result.error {
            event = event.with_metadata("error", error.clone());
        }
        self.audit.emit(event);

        result
    }

    async fn dispatch(
        &self,
        action: ExecutableAction,
        params: &ActionParams,
        now: DateTime<Utc>,
    ) -> Result<ExecutionResult, ApplicationError> {
        match action {
            ExecutableAction::AssignDriver => self.assign_driver(params, now).await,
            ExecutableAction::CreateProductionBatch => self.create_production_batch(params, now).await,
            ExecutableAction::SendText => self.send_text(params, now).await,
            ExecutableAction::SendRouteToDriver => self.send_route_to_driver(params, now).await,
            ExecutableAction::UpdateInvoiceStatus => self.update_invoice_status(params, now).await,
            ExecutableAction::MarkStoreTag => self.mark_store_tag(params, now).await,
            ExecutableAction::AddFollowupTask => self.add_followup_task(params, now).await,
            ExecutableAction::PushWholesaleItem => self.push_wholesale_item(params, now).await,
            ExecutableAction::ExportData => export_data(params, now),
            ExecutableAction::SendNotification => self.send_notification(params, now).await,
        }
    }

    async fn assign_driver(
        &self,
        params: &ActionParams,
        now: DateTime<Utc>,
    ) -> Result<ExecutionResult, ApplicationError> {
        let action = ExecutableAction::AssignDriver;
        let route_ids = required_ids(action, params)?;
        let driver_id = required_text(action, "driver_id", params.driver_id.as_deref())?;
        let driver_name = self.driver_name(driver_id).await?;

        let mut patch = Record::new();
        patch.insert("driver_id".to_string(), json!(driver_id));
        if let Some(name) = &driver_name {
            patch.insert("driver_name".to_string(), json!(name));
        }
        patch.insert("status".to_string(), json!("assigned"));
        patch.insert("updated_at".to_string(), timestamp(now));

        let updated = self.store.update(Collection::Routes, &route_ids, patch).await?;
        let label = driver_name.unwrap_or_else(|| driver_id.to_string());
        Ok(ExecutionResult::succeeded(
            format!("Assigned {label} to {updated} {}", plural(updated, "route", "routes")),
            updated,
        ))
    }

    async fn create_production_batch(
        &self,
        params: &ActionParams,
        now: DateTime<Utc>,
    ) -> Result<ExecutionResult, ApplicationError> {
        let action = ExecutableAction::CreateProductionBatch;
        let brand = required_text(action, "brand", params.brand.as_deref())?;
        let quantity = params.quantity.ok_or_else(|| DomainError::missing(action, "quantity"))?;
        if quantity == 0 {
            return Err(DomainError::invalid(action, "quantity", "must be greater than zero").into());
        }
        let scheduled_for =
            params.due_date.unwrap_or_else(|| (now + Duration::days(BATCH_LEAD_DAYS)).date_naive());

        let mut record = Record::new();
        record.insert("brand".to_string(), json!(brand));
        record.insert("quantity".to_string(), json!(quantity));
        record.insert("status".to_string(), json!("planned"));
        record.insert("scheduled_for".to_string(), json!(scheduled_for.to_string()));
        record.insert("source_ids".to_string(), json!(params.target_ids()));
        record.insert("requested_by".to_string(), json!(actor(params)));
        record.insert("created_at".to_string(), timestamp(now));

        let batch = self.store.insert(Collection::ProductionBatches, record).await?;
        Ok(ExecutionResult::succeeded(
            format!("Scheduled a {quantity}-unit {brand} batch for {scheduled_for}"),
            1,
        )
        .with_data(Value::Object(batch)))
    }

    async fn send_text(
        &self,
        params: &ActionParams,
        now: DateTime<Utc>,
    ) -> Result<ExecutionResult, ApplicationError> {
        let action = ExecutableAction::SendText;
        let store_ids = required_ids(action, params)?;
        let body = required_text(action, "message", params.message.as_deref())?;

        let total = store_ids.len() as u64;
        for (queued, store_id) in (0u64..).zip(&store_ids) {
            let message = queued_message("store", store_id, body, now);
            if let Err(source) = self.store.insert(Collection::Messages, message).await {
                return Err(ApplicationError::PartialDelivery { queued, total, source });
            }
        }

        let count = total;
        Ok(ExecutionResult::succeeded(
            format!("Queued {count} text {}", plural(count, "message", "messages")),
            count,
        ))
    }

    async fn send_route_to_driver(
        &self,
        params: &ActionParams,
        now: DateTime<Utc>,
    ) -> Result<ExecutionResult, ApplicationError> {
        let action = ExecutableAction::SendRouteToDriver;
        let route_ids = required_ids(action, params)?;
        let driver_id = required_text(action, "driver_id", params.driver_id.as_deref())?;

        let total = route_ids.len() as u64;
        for (queued, route_id) in (0u64..).zip(&route_ids) {
            let body = params
                .message
                .clone()
                .unwrap_or_else(|| format!("Route {route_id} is ready for pickup."));
            let mut message = queued_message("driver", driver_id, &body, now);
            message.insert("route_id".to_string(), json!(route_id));
            if let Err(source) = self.store.insert(Collection::Messages, message).await {
                return Err(ApplicationError::PartialDelivery { queued, total, source });
            }
        }

        let mut patch = Record::new();
        patch.insert("status".to_string(), json!("dispatched"));
        patch.insert("dispatched_at".to_string(), timestamp(now));
        let updated = self.store.update(Collection::Routes, &route_ids, patch).await?;

        Ok(ExecutionResult::succeeded(
            format!("Sent {updated} {} to driver {driver_id}", plural(updated, "route", "routes")),
            updated,
        ))
    }

    async fn update_invoice_status(
        &self,
        params: &ActionParams,
        now: DateTime<Utc>,
    ) -> Result<ExecutionResult, ApplicationError> {
        let action = ExecutableAction::UpdateInvoiceStatus;
        let invoice_ids = required_ids(action, params)?;
        let status = required_text(action, "status", params.status.as_deref())?.to_ascii_lowercase();
        if !INVOICE_STATUSES.contains(&status.as_str()) {
            return Err(DomainError::invalid(
                action,
                "status",
                format!("expected one of {}", INVOICE_STATUSES.join(", ")),
            )
            .into());
        }

        let mut patch = Record::new();
        patch.insert("status".to_string(), json!(status));
        patch.insert("updated_at".to_string(), timestamp(now));
        if status == "paid" {
            patch.insert("paid_at".to_string(), timestamp(now));
        }

        let updated = self.store.update(Collection::Invoices, &invoice_ids, patch).await?;
        Ok(ExecutionResult::succeeded(
            format!("Marked {updated} {} as {status}", plural(updated, "invoice", "invoices")),
            updated,
        ))
    }

    /// Appends the tag to each store's `tags` list; stores already tagged are skipped.
    async fn mark_store_tag(
        &self,
        params: &ActionParams,
        now: DateTime<Utc>,
    ) -> Result<ExecutionResult, ApplicationError> {
        let action = ExecutableAction::MarkStoreTag;
        let store_ids = required_ids(action, params)?;
        let tag = required_text(action, "tag", params.tag.as_deref())?.to_ascii_lowercase();

        let query = RecordQuery::new(Collection::Stores)
            .filter("id", FilterOp::In(store_ids.iter().map(|id| json!(id)).collect()));
        let stores = self.store.select(&query).await?;

        let mut tagged = 0;
        for store in &stores {
            let Some(store_id) = record_id(store) else {
                continue;
            };
            let mut tags: Vec<Value> =
                store.get("tags").and_then(Value::as_array).cloned().unwrap_or_default();
            if tags.iter().any(|existing| existing.as_str() == Some(tag.as_str())) {
                continue;
            }
            tags.push(json!(tag));

            let mut patch = Record::new();
            patch.insert("tags".to_string(), Value::Array(tags));
            patch.insert("updated_at".to_string(), timestamp(now));
            tagged += self.store.update(Collection::Stores, &[store_id.to_string()], patch).await?;
        }

        Ok(ExecutionResult::succeeded(
            format!("Tagged {tagged} {} as {tag}", plural(tagged, "store", "stores")),
            tagged,
        ))
    }

    async fn add_followup_task(
        &self,
        params: &ActionParams,
        now: DateTime<Utc>,
    ) -> Result<ExecutionResult, ApplicationError> {
        let action = ExecutableAction::AddFollowupTask;
        let entity_ids = required_ids(action, params)?;
        let due_date =
            params.due_date.unwrap_or_else(|| (now + Duration::days(FOLLOWUP_DUE_DAYS)).date_naive());
        let title = params.title.clone().unwrap_or_else(|| "Follow up".to_string());

        for entity_id in &entity_ids {
            let mut task = Record::new();
            task.insert("task_type".to_string(), json!("communication_followup"));
            task.insert("floor".to_string(), json!(5));
            task.insert("title".to_string(), json!(title));
            task.insert("description".to_string(), json!(params.message));
            task.insert("entity_id".to_string(), json!(entity_id));
            task.insert("priority".to_string(), json!("medium"));
            task.insert("status".to_string(), json!("pending"));
            task.insert("source".to_string(), json!("manual"));
            task.insert("due_date".to_string(), json!(due_date.to_string()));
            task.insert("created_at".to_string(), timestamp(now));
            self.store.insert(Collection::Tasks, task).await?;
        }

        let count = entity_ids.len() as u64;
        Ok(ExecutionResult::succeeded(
            format!("Added {count} follow-up {} due {due_date}", plural(count, "task", "tasks")),
            count,
        ))
    }

    /// Lists existing items by id, or creates a new listing from name, brand,
    /// price and quantity.
    async fn push_wholesale_item(
        &self,
        params: &ActionParams,
        now: DateTime<Utc>,
    ) -> Result<ExecutionResult, ApplicationError> {
        let action = ExecutableAction::PushWholesaleItem;
        if let Some(price) = params.price {
            if price.is_sign_negative() {
                return Err(DomainError::invalid(action, "price", "must not be negative").into());
            }
        }

        let item_ids = params.target_ids();
        if !item_ids.is_empty() {
            let mut patch = Record::new();
            patch.insert("status".to_string(), json!("listed"));
            patch.insert("listed_at".to_string(), timestamp(now));
            if let Some(price) = params.price {
                patch.insert("price".to_string(), decimal_value(price));
            }
            let updated = self.store.update(Collection::WholesaleItems, &item_ids, patch).await?;
            return Ok(ExecutionResult::succeeded(
                format!("Listed {updated} wholesale {}", plural(updated, "item", "items")),
                updated,
            ));
        }

        let name = required_text(action, "name", params.name.as_deref())?;
        let brand = required_text(action, "brand", params.brand.as_deref())?;
        let price = params.price.ok_or_else(|| DomainError::missing(action, "price"))?;
        let quantity = params.quantity.ok_or_else(|| DomainError::missing(action, "quantity"))?;

        let mut record = Record::new();
        record.insert("name".to_string(), json!(name));
        record.insert("brand".to_string(), json!(brand));
        record.insert("price".to_string(), decimal_value(price));
        record.insert("quantity".to_string(), json!(quantity));
        record.insert("status".to_string(), json!("listed"));
        record.insert("listed_at".to_string(), timestamp(now));

        let item = self.store.insert(Collection::WholesaleItems, record).await?;
        Ok(ExecutionResult::succeeded(format!("Listed {name} on wholesale"), 1)
            .with_data(Value::Object(item)))
    }

    async fn send_notification(
        &self,
        params: &ActionParams,
        now: DateTime<Utc>,
    ) -> Result<ExecutionResult, ApplicationError> {
        let action = ExecutableAction::SendNotification;
        let body = required_text(action, "message", params.message.as_deref())?;

        let mut notification = Record::new();
        notification.insert(
            "title".to_string(),
            json!(params.title.clone().unwrap_or_else(|| "Ops notification".to_string())),
        );
        notification.insert("body".to_string(), json!(body));
        notification.insert("entity_ids".to_string(), json!(params.target_ids()));
        notification.insert("status".to_string(), json!("queued"));
        notification.insert("created_at".to_string(), timestamp(now));

        self.store.insert(Collection::Notifications, notification).await?;
        Ok(ExecutionResult::succeeded("Notification queued", 1))
    }

    async fn driver_name(&self, driver_id: &str) -> Result<Option<String>, ApplicationError> {
        let query = RecordQuery::new(Collection::Drivers)
            .filter("id", FilterOp::Eq(json!(driver_id)))
            .limit(1);
        let drivers = self.store.select(&query).await?;
        Ok(drivers
            .first()
            .and_then(|driver| driver.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    /// Best effort; a failed log write never changes the action outcome.
    async fn record_activity(
        &self,
        action: ExecutableAction,
        params: &ActionParams,
        result: &ExecutionResult,
        now: DateTime<Utc>,
    ) {
        if action == ExecutableAction::ExportData {
            return;
        }

        let mut entry = Record::new();
        entry.insert("action".to_string(), json!(action.as_str()));
        entry.insert("message".to_string(), json!(result.message));
        entry.insert("affected_count".to_string(), json!(result.affected_count));
        entry.insert("entity_ids".to_string(), json!(params.target_ids()));
        entry.insert("actor".to_string(), json!(actor(params)));
        entry.insert("created_at".to_string(), timestamp(now));

        if let Err(error) = self.store.insert(Collection::ActivityLog, entry).await {
            tracing::warn!(
                event_name = "execution.activity_log_failed",
                action = action.as_str(),
                error = %error,
                "failed to record activity log entry"
            );
        }
    }
}

/// Renders the supplied result set as CSV. Columns are the fixed result
/// fields followed by payload keys in first-seen order.
fn export_data(params: &ActionParams, now: DateTime<Utc>) -> Result<ExecutionResult, ApplicationError> {
    if params.results.is_empty() {
        return Err(DomainError::missing(ExecutableAction::ExportData, "results").into());
    }

    let csv = render_csv(&params.results)?;
    let count = params.results.len() as u64;
    let filename = format!("grabba-export-{}.csv", now.format("%Y%m%d-%H%M%S"));
    Ok(ExecutionResult::succeeded(
        format!("Exported {count} {}", plural(count, "row", "rows")),
        count,
    )
    .with_data(json!({ "filename": filename, "content_type": "text/csv", "csv": csv })))
}

fn render_csv(results: &[QueryResult]) -> Result<String, ApplicationError> {
    let mut data_columns: Vec<&str> = Vec::new();
    for result in results {
        for key in result.data.keys() {
            if key != "id" && !data_columns.contains(&key.as_str()) {
                data_columns.push(key.as_str());
            }
        }
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer
        .write_record(["id", "type", "title", "subtitle"].iter().chain(data_columns.iter()))
        .map_err(export_error)?;

    for result in results {
        let mut row = vec![
            result.id.clone(),
            result.kind.as_str().to_string(),
            result.title.clone(),
            result.subtitle.clone().unwrap_or_default(),
        ];
        row.extend(data_columns.iter().map(|column| match result.data.get(*column) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        }));
        writer.write_record(&row).map_err(export_error)?;
    }

    let bytes = writer.into_inner().map_err(|error| export_error(error.error()))?;
    String::from_utf8(bytes).map_err(export_error)
}

fn export_error(error: impl std::fmt::Display) -> ApplicationError {
    ApplicationError::Export(error.to_string())
}

fn queued_message(recipient_type: &str, recipient_id: &str, body: &str, now: DateTime<Utc>) -> Record {
    let mut message = Record::new();
    message.insert("channel".to_string(), json!("sms"));
    message.insert("recipient_type".to_string(), json!(recipient_type));
    message.insert("recipient_id".to_string(), json!(recipient_id));
    message.insert("body".to_string(), json!(body));
    message.insert("status".to_string(), json!("queued"));
    message.insert("created_at".to_string(), timestamp(now));
    message
}

fn required_ids(action: ExecutableAction, params: &ActionParams) -> Result<Vec<String>, DomainError> {
    let ids: Vec<String> = params
        .target_ids()
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();
    if ids.is_empty() {
        return Err(DomainError::missing(action, "entity_ids"));
    }
    Ok(ids)
}

fn required_text<'a>(
    action: ExecutableAction,
    parameter: &'static str,
    value: Option<&'a str>,
) -> Result<&'a str, DomainError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| DomainError::missing(action, parameter))
}

fn rejection_message(error: &DomainError) -> String {
    match error {
        DomainError::MissingParameter { parameter, .. } => format!("Missing required parameter: {parameter}"),
        DomainError::InvalidParameter { parameter, reason, .. } => {
            format!("Invalid {parameter}: {reason}")
        }
        other => other.to_string(),
    }
}

fn actor(params: &ActionParams) -> String {
    params.requested_by.clone().unwrap_or_else(|| DEFAULT_ACTOR.to_string())
}

fn timestamp(now: DateTime<Utc>) -> Value {
    json!(now.to_rfc3339())
}

fn plural<'a>(count: u64, singular: &'a str, plural: &'a str) -> &'a str {
    if count == 1 {
        singular
    } else {
        plural
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;
    use serde_json::{json, Map};

    use super::ExecutionEngine;
    use crate::audit::{AuditOutcome, InMemoryAuditSink};
    use crate::domain::command::{QueryResult, ResultKind};
    use crate::domain::execution::{ActionParams, ExecutableAction};
    use crate::store::testing::{FakeStore, UnreachableStore};
    use crate::store::Collection;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 9, 0, 0).single().expect("valid timestamp")
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[tokio::test]
    async fn missing_parameters_fail_without_touching_the_store() {
        let audit = InMemoryAuditSink::default();
        let engine = ExecutionEngine::with_audit_sink(FakeStore::default(), Arc::new(audit.clone()));
        let params = ActionParams { entity_ids: ids(&["route-1"]), ..ActionParams::default() };

        let result = engine.execute_action_at(ExecutableAction::AssignDriver, &params, now()).await;

        assert!(!result.success);
        assert_eq!(result.message, "Missing required parameter: driver_id");
        assert_eq!(result.error.as_deref(), Some("assign_driver requires driver_id"));
        assert!(engine.store().all(Collection::ActivityLog).await.is_empty());

        let events = audit.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].outcome, AuditOutcome::Rejected);
        assert_eq!(events[0].event_type, "execution.assign_driver");
    }

    #[tokio::test]
    async fn assign_driver_updates_routes_and_names_the_driver() {
        let store = FakeStore::with(
            Collection::Routes,
            vec![
                json!({ "id": "route-1", "status": "planned" }),
                json!({ "id": "route-2", "status": "planned" }),
            ],
        )
        .await;
        store.insert_json(Collection::Drivers, json!({ "id": "driver-7", "name": "Marcus" })).await;
        let engine = ExecutionEngine::new(store);
        let params = ActionParams {
            entity_ids: ids(&["route-1", "route-2"]),
            driver_id: Some("driver-7".to_string()),
            ..ActionParams::default()
        };

        let result = engine.execute_action_at(ExecutableAction::AssignDriver, &params, now()).await;

        assert!(result.success, "{result:?}");
        assert_eq!(result.affected_count, Some(2));
        assert_eq!(result.message, "Assigned Marcus to 2 routes");
        let routes = engine.store().all(Collection::Routes).await;
        assert!(routes.iter().all(|route| route["driver_id"] == "driver-7"));
        assert!(routes.iter().all(|route| route["status"] == "assigned"));
        assert_eq!(engine.store().all(Collection::ActivityLog).await.len(), 1);
    }

    #[tokio::test]
    async fn ids_are_lifted_from_a_result_set() {
        let store = FakeStore::with(
            Collection::Invoices,
            vec![json!({ "id": "inv-1", "status": "unpaid" }), json!({ "id": "inv-2", "status": "overdue" })],
        )
        .await;
        let engine = ExecutionEngine::new(store);
        let results = ["inv-1", "inv-2"]
            .iter()
            .map(|id| QueryResult {
                id: id.to_string(),
                kind: ResultKind::Invoice,
                title: "Corner Deli".to_string(),
                subtitle: None,
                data: Map::new(),
            })
            .collect();
        let params = ActionParams {
            results,
            status: Some("Paid".to_string()),
            ..ActionParams::default()
        };

        let result =
            engine.execute_action_at(ExecutableAction::UpdateInvoiceStatus, &params, now()).await;

        assert!(result.success);
        assert_eq!(result.message, "Marked 2 invoices as paid");
        let invoices = engine.store().all(Collection::Invoices).await;
        assert!(invoices.iter().all(|invoice| invoice["status"] == "paid" && invoice.contains_key("paid_at")));
    }

    #[tokio::test]
    async fn invalid_invoice_status_is_rejected() {
        let engine = ExecutionEngine::new(FakeStore::default());
        let params = ActionParams {
            entity_ids: ids(&["inv-1"]),
            status: Some("settled".to_string()),
            ..ActionParams::default()
        };

        let result =
            engine.execute_action_at(ExecutableAction::UpdateInvoiceStatus, &params, now()).await;

        assert!(!result.success);
        assert!(result.message.starts_with("Invalid status: expected one of paid"));
    }

    #[tokio::test]
    async fn store_tags_are_appended_once() {
        let store = FakeStore::with(
            Collection::Stores,
            vec![
                json!({ "id": "store-1", "tags": ["vip"] }),
                json!({ "id": "store-2" }),
            ],
        )
        .await;
        let engine = ExecutionEngine::new(store);
        let params = ActionParams {
            entity_ids: ids(&["store-1", "store-2"]),
            tag: Some("VIP".to_string()),
            ..ActionParams::default()
        };

        let result = engine.execute_action_at(ExecutableAction::MarkStoreTag, &params, now()).await;

        assert!(result.success);
        assert_eq!(result.affected_count, Some(1));
        let stores = engine.store().all(Collection::Stores).await;
        assert_eq!(stores[0]["tags"], json!(["vip"]));
        assert_eq!(stores[1]["tags"], json!(["vip"]));
    }

    #[tokio::test]
    async fn outbound_actions_are_recorded_as_queued_rows() {
        let engine = ExecutionEngine::new(FakeStore::default());
        let text = ActionParams {
            entity_ids: ids(&["store-1", "store-2"]),
            message: Some("Your invoice is past due".to_string()),
            ..ActionParams::default()
        };
        let notify = ActionParams {
            message: Some("Restock run at 3pm".to_string()),
            ..ActionParams::default()
        };

        let texted = engine.execute_action_at(ExecutableAction::SendText, &text, now()).await;
        let notified = engine.execute_action_at(ExecutableAction::SendNotification, &notify, now()).await;

        assert_eq!(texted.affected_count, Some(2));
        assert!(notified.success);
        let messages = engine.store().all(Collection::Messages).await;
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|message| message["status"] == "queued"));
        assert_eq!(engine.store().all(Collection::Notifications).await.len(), 1);
    }

    #[tokio::test]
    async fn production_batch_defaults_to_next_day() {
        let engine = ExecutionEngine::new(FakeStore::default());
        let params = ActionParams {
            brand: Some("Grabba R".to_string()),
            quantity: Some(200),
            ..ActionParams::default()
        };

        let result =
            engine.execute_action_at(ExecutableAction::CreateProductionBatch, &params, now()).await;

        assert!(result.success);
        assert_eq!(result.message, "Scheduled a 200-unit Grabba R batch for 2026-10-15");
        let batches = engine.store().all(Collection::ProductionBatches).await;
        assert_eq!(batches[0]["status"], "planned");
        assert_eq!(batches[0]["scheduled_for"], "2026-10-15");
    }

    #[tokio::test]
    async fn followup_tasks_use_explicit_due_date() {
        let engine = ExecutionEngine::new(FakeStore::default());
        let params = ActionParams {
            entity_ids: ids(&["store-4"]),
            title: Some("Check in on reorder".to_string()),
            due_date: NaiveDate::from_ymd_opt(2026, 10, 20),
            ..ActionParams::default()
        };

        let result = engine.execute_action_at(ExecutableAction::AddFollowupTask, &params, now()).await;

        assert!(result.success);
        let tasks = engine.store().all(Collection::Tasks).await;
        assert_eq!(tasks[0]["due_date"], "2026-10-20");
        assert_eq!(tasks[0]["entity_id"], "store-4");
        assert_eq!(tasks[0]["floor"], 5);
    }

    #[tokio::test]
    async fn wholesale_listing_requires_full_details_without_ids() {
        let engine = ExecutionEngine::new(FakeStore::default());
        let partial = ActionParams { name: Some("Case of 50".to_string()), ..ActionParams::default() };
        let complete = ActionParams {
            name: Some("Case of 50".to_string()),
            brand: Some("Hot Mama".to_string()),
            price: Some(Decimal::new(18_500, 2)),
            quantity: Some(12),
            ..ActionParams::default()
        };

        let rejected =
            engine.execute_action_at(ExecutableAction::PushWholesaleItem, &partial, now()).await;
        let listed = engine.execute_action_at(ExecutableAction::PushWholesaleItem, &complete, now()).await;

        assert_eq!(rejected.message, "Missing required parameter: brand");
        assert!(listed.success);
        let items = engine.store().all(Collection::WholesaleItems).await;
        assert_eq!(items[0]["price"], json!(185.0));
        assert_eq!(items[0]["status"], "listed");
    }

    #[tokio::test]
    async fn export_renders_csv_without_store_access() {
        let engine = ExecutionEngine::new(UnreachableStore);
        let mut data = Map::new();
        data.insert("amount".to_string(), json!(450.5));
        data.insert("note".to_string(), json!("call \"Ray\", after 5"));
        let params = ActionParams {
            results: vec![QueryResult {
                id: "inv-1".to_string(),
                kind: ResultKind::Invoice,
                title: "Corner Deli".to_string(),
                subtitle: Some("$450.50 · due 2026-09-20".to_string()),
                data,
            }],
            ..ActionParams::default()
        };

        let result = engine.execute_action_at(ExecutableAction::ExportData, &params, now()).await;

        assert!(result.success, "{result:?}");
        let payload = result.data.expect("csv payload");
        assert_eq!(payload["filename"], "grabba-export-20261014-090000.csv");
        assert_eq!(
            payload["csv"],
            "id,type,title,subtitle,amount,note\n\
             inv-1,invoice,Corner Deli,$450.50 · due 2026-09-20,450.5,\"call \"\"Ray\"\", after 5\"\n"
        );
    }

    #[tokio::test]
    async fn export_leaves_absent_columns_blank_and_quotes_multiline_cells() {
        let engine = ExecutionEngine::new(UnreachableStore);
        let mut first = Map::new();
        first.insert("tubes_left".to_string(), json!(3));
        let mut second = Map::new();
        second.insert("notes".to_string(), json!("back door\nring twice"));
        let result = |id: &str, data: Map<String, serde_json::Value>| QueryResult {
            id: id.to_string(),
            kind: ResultKind::Store,
            title: id.to_uppercase(),
            subtitle: None,
            data,
        };
        let params = ActionParams {
            results: vec![result("s1", first), result("s2", second)],
            ..ActionParams::default()
        };

        let exported = engine.execute_action_at(ExecutableAction::ExportData, &params, now()).await;

        assert_eq!(exported.message, "Exported 2 rows");
        assert_eq!(
            exported.data.expect("csv payload")["csv"],
            "id,type,title,subtitle,tubes_left,notes\n\
             s1,store,S1,,3,\n\
             s2,store,S2,,,\"back door\nring twice\"\n"
        );
    }

    #[tokio::test]
    async fn store_failures_become_failed_results() {
        let audit = InMemoryAuditSink::default();
        let engine = ExecutionEngine::with_audit_sink(UnreachableStore, Arc::new(audit.clone()));
        let params = ActionParams {
            entity_ids: ids(&["store-1"]),
            message: Some("hello".to_string()),
            ..ActionParams::default()
        };

        let result = engine.execute_action_at(ExecutableAction::SendText, &params, now()).await;

        assert!(!result.success);
        assert_eq!(result.message, "Could not complete send text");
        assert_eq!(
            result.error.as_deref(),
            Some("queued 0 of 1 messages before the store failed: store backend failure: connection refused")
        );
        assert_eq!(audit.events()[0].outcome, AuditOutcome::Failed);
    }

    #[tokio::test]
    async fn send_text_reports_messages_queued_before_a_failure() {
        let audit = InMemoryAuditSink::default();
        let store = FakeStore::default();
        store.fail_inserts_after(2).await;
        let engine = ExecutionEngine::with_audit_sink(store, Arc::new(audit.clone()));
        let params = ActionParams {
            entity_ids: ids(&["store-1", "store-2", "store-3"]),
            message: Some("Restock arriving Friday".to_string()),
            ..ActionParams::default()
        };

        let result = engine.execute_action_at(ExecutableAction::SendText, &params, now()).await;

        assert!(!result.success);
        assert_eq!(result.affected_count, Some(2));
        assert_eq!(
            result.error.as_deref(),
            Some("queued 2 of 3 messages before the store failed: store backend failure: disk I/O error")
        );
        assert_eq!(engine.store().all(Collection::Messages).await.len(), 2);
        assert!(engine.store().all(Collection::ActivityLog).await.is_empty());
        assert_eq!(audit.events()[0].metadata.get("affected_count").map(String::as_str), Some("2"));
    }

    #[tokio::test]
    async fn route_dispatch_stops_without_updating_routes_when_a_message_fails() {
        let store = FakeStore::with(
            Collection::Routes,
            vec![
                json!({ "id": "route-1", "status": "assigned" }),
                json!({ "id": "route-2", "status": "assigned" }),
            ],
        )
        .await;
        store.fail_inserts_after(1).await;
        let engine = ExecutionEngine::new(store);
        let params = ActionParams {
            entity_ids: ids(&["route-1", "route-2"]),
            driver_id: Some("driver-7".to_string()),
            ..ActionParams::default()
        };

        let result =
            engine.execute_action_at(ExecutableAction::SendRouteToDriver, &params, now()).await;

        assert!(!result.success);
        assert_eq!(result.affected_count, Some(1));
        assert!(result.error.as_deref().is_some_and(|error| error.starts_with("queued 1 of 2 messages")));
        let routes = engine.store().all(Collection::Routes).await;
        assert!(routes.iter().all(|route| route["status"] == "assigned"));
    }

    #[tokio::test]
    async fn unknown_action_names_fail_cleanly() {
        let engine = ExecutionEngine::new(FakeStore::default());

        let result = engine.execute_named("launch_rocket", &ActionParams::default()).await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("unsupported action `launch_rocket`"));
    }
}
