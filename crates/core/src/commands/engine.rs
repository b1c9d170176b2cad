//! Command processing: parse, dispatch to a query handler, summarize.
//!
//! The engine never fails for operator input. Unrecognized text yields a
//! completed response with guidance, and store failures are reported through
//! `CommandResponse::status` with the underlying message preserved.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::commands::parser::parse_command;
use crate::commands::registry::{all_shortcuts, intent_by_id};
use crate::config::EngineConfig;
use crate::domain::command::{
    CommandEntities, CommandId, CommandResponse, CommandStatus, IntentId, ParsedCommand,
    QueryResult, ResultKind,
};
use crate::store::{
    decimal_value, record_f64, record_id, record_str, Collection, FilterOp, OperationsStore,
    Record, RecordQuery, SortDirection, StoreError,
};

pub const UNRECOGNIZED_SUMMARY: &str =
    "I couldn't match that to a query. Try a shortcut like /unpaid, /low or /routes, or type /help.";

const OPEN_INVOICE_STATUSES: &[&str] = &["unpaid", "overdue", "partial"];
const OPEN_BATCH_STATUSES: &[&str] = &["planned", "in_progress"];
const TOP_STORE_LIMIT: usize = 10;

type Render = fn(&Record) -> Option<String>;

/// A resolved query plus how to present its rows.
struct QueryPlan {
    query: RecordQuery,
    kind: ResultKind,
    title: Render,
    subtitle: Render,
}

pub struct CommandEngine<S> {
    store: S,
    config: EngineConfig,
}

impl<S: OperationsStore> CommandEngine<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn process_command(&self, text: &str) -> CommandResponse {
        self.process_command_at(text, Utc::now()).await
    }

    /// Processes `text` with relative dates resolved against `now`.
    pub async fn process_command_at(&self, text: &str, now: DateTime<Utc>) -> CommandResponse {
        let today = now.date_naive();
        let command = parse_command(text, today);
        let id = CommandId(Uuid::new_v4().to_string());

        let Some(definition) = intent_by_id(command.intent) else {
            tracing::info!(
                event_name = "command.unrecognized",
                command_id = %id.0,
                confidence = command.confidence,
                "command did not match a registered intent"
            );
            return CommandResponse {
                id,
                command,
                status: CommandStatus::Completed,
                summary: UNRECOGNIZED_SUMMARY.to_string(),
                results: Vec::new(),
                suggested_actions: Vec::new(),
                error: None,
                executed_at: now,
            };
        };
        let suggested_actions = definition.suggested_actions.clone();

        match self.run_query(&command, today).await {
            Ok(results) => {
                let summary = summarize(&command, results.len(), &self.config, today);
                tracing::info!(
                    event_name = "command.processed",
                    command_id = %id.0,
                    intent = command.intent.as_str(),
                    confidence = command.confidence,
                    is_shortcut = command.is_shortcut,
                    result_count = results.len(),
                    "command processed"
                );
                CommandResponse {
                    id,
                    command,
                    status: CommandStatus::Completed,
                    summary,
                    results,
                    suggested_actions,
                    error: None,
                    executed_at: now,
                }
            }
            Err(error) => {
                tracing::warn!(
                    event_name = "command.query_failed",
                    command_id = %id.0,
                    intent = command.intent.as_str(),
                    error = %error,
                    "command query failed"
                );
                CommandResponse {
                    id,
                    command,
                    status: CommandStatus::Error,
                    summary: format!("Couldn't load {}.", definition.name.to_lowercase()),
                    results: Vec::new(),
                    suggested_actions,
                    error: Some(error.to_string()),
                    executed_at: now,
                }
            }
        }
    }

    async fn run_query(
        &self,
        command: &ParsedCommand,
        today: NaiveDate,
    ) -> Result<Vec<QueryResult>, StoreError> {
        let Some(plan) = plan_query(command.intent, &command.entities, &self.config, today) else {
            return Ok(Vec::new());
        };
        let limit = plan
            .query
            .limit
            .map_or(self.config.result_limit, |limit| limit.min(self.config.result_limit));
        let query = plan.query.limit(limit);

        let records = self.store.select(&query).await?;
        Ok(records
            .into_iter()
            .filter_map(|record| present(plan.kind, plan.title, plan.subtitle, record))
            .collect())
    }
}

fn plan_query(
    intent: IntentId,
    entities: &CommandEntities,
    config: &EngineConfig,
    today: NaiveDate,
) -> Option<QueryPlan> {
    let plan = match intent {
        IntentId::QueryUnpaid => {
            let statuses = match entities.status.as_deref() {
                Some(status @ ("overdue" | "partial")) => vec![json!(status)],
                _ => OPEN_INVOICE_STATUSES.iter().map(|status| json!(status)).collect(),
            };
            let mut query = RecordQuery::new(Collection::Invoices)
                .filter("status", FilterOp::In(statuses))
                .order_by("amount", SortDirection::Desc);
            if let Some(amount) = entities.amount {
                query = query.filter("amount", FilterOp::Gt(decimal_value(amount)));
            }
            if let Some(days) = entities.days {
                query = query.filter("due_date", FilterOp::Lte(date_value(days_before(today, days))));
            }
            QueryPlan {
                query: with_brand(query, entities),
                kind: ResultKind::Invoice,
                title: store_title,
                subtitle: invoice_subtitle,
            }
        }
        IntentId::QueryLowStock => {
            let days = entities.days.unwrap_or(config.low_stock_days);
            let query = RecordQuery::new(Collection::Inventory)
                .filter("days_until_empty", FilterOp::Lte(json!(days)))
                .order_by("days_until_empty", SortDirection::Asc);
            QueryPlan {
                query: with_brand(query, entities),
                kind: ResultKind::Inventory,
                title: store_title,
                subtitle: inventory_subtitle,
            }
        }
        IntentId::QueryInactiveStores => {
            let days = entities.days.unwrap_or(config.inactive_store_days);
            QueryPlan {
                query: RecordQuery::new(Collection::Stores)
                    .filter("last_order_date", FilterOp::Lte(date_value(days_before(today, days))))
                    .order_by("last_order_date", SortDirection::Asc),
                kind: ResultKind::Store,
                title: name_title,
                subtitle: last_order_subtitle,
            }
        }
        IntentId::QueryDeliveries => {
            let (start, end) = delivery_period(entities, today);
            let mut query = RecordQuery::new(Collection::Routes)
                .filter("date", FilterOp::Gte(date_value(start)))
                .filter("date", FilterOp::Lte(date_value(end)))
                .order_by("date", SortDirection::Asc);
            if let Some(status) = &entities.status {
                query = query.filter("status", FilterOp::Eq(json!(status)));
            }
            QueryPlan { query, kind: ResultKind::Route, title: name_title, subtitle: route_subtitle }
        }
        IntentId::QueryDrivers => {
            let status = match entities.status.as_deref() {
                Some("inactive") => "inactive",
                _ => "active",
            };
            QueryPlan {
                query: RecordQuery::new(Collection::Drivers)
                    .filter("status", FilterOp::Eq(json!(status)))
                    .order_by("on_time_rate", SortDirection::Asc),
                kind: ResultKind::Driver,
                title: name_title,
                subtitle: driver_subtitle,
            }
        }
        IntentId::QueryAmbassadors => {
            let mut query = RecordQuery::new(Collection::Ambassadors)
                .order_by("last_activity_date", SortDirection::Asc);
            if let Some(days) = ambassador_inactivity(entities, config) {
                query = query
                    .filter("last_activity_date", FilterOp::Lte(date_value(days_before(today, days))));
            }
            QueryPlan {
                query,
                kind: ResultKind::Ambassador,
                title: name_title,
                subtitle: ambassador_subtitle,
            }
        }
        IntentId::QueryProduction => {
            let statuses = match entities.status.as_deref() {
                Some(status @ ("planned" | "in_progress" | "completed")) => vec![json!(status)],
                _ => OPEN_BATCH_STATUSES.iter().map(|status| json!(status)).collect(),
            };
            let query = RecordQuery::new(Collection::ProductionBatches)
                .filter("status", FilterOp::In(statuses))
                .order_by("scheduled_for", SortDirection::Asc);
            QueryPlan {
                query: with_brand(query, entities),
                kind: ResultKind::ProductionBatch,
                title: batch_title,
                subtitle: batch_subtitle,
            }
        }
        IntentId::QueryTopStores => QueryPlan {
            query: RecordQuery::new(Collection::Stores)
                .order_by("monthly_volume", SortDirection::Desc)
                .limit(TOP_STORE_LIMIT),
            kind: ResultKind::Store,
            title: name_title,
            subtitle: volume_subtitle,
        },
        IntentId::QueryFollowups => {
            let days = entities.days.unwrap_or(config.followup_gap_days);
            QueryPlan {
                query: RecordQuery::new(Collection::Stores)
                    .filter(
                        "last_contact_date",
                        FilterOp::Lte(date_value(days_before(today, days))),
                    )
                    .order_by("last_contact_date", SortDirection::Asc),
                kind: ResultKind::Store,
                title: name_title,
                subtitle: last_contact_subtitle,
            }
        }
        IntentId::QueryWholesale => {
            let mut query =
                RecordQuery::new(Collection::WholesaleItems).order_by("name", SortDirection::Asc);
            if let Some(status) = &entities.status {
                query = query.filter("status", FilterOp::Eq(json!(status)));
            }
            QueryPlan {
                query: with_brand(query, entities),
                kind: ResultKind::WholesaleItem,
                title: name_title,
                subtitle: wholesale_subtitle,
            }
        }
        IntentId::ShowHelp | IntentId::Unknown => return None,
    };
    Some(plan)
}

fn summarize(
    command: &ParsedCommand,
    count: usize,
    config: &EngineConfig,
    today: NaiveDate,
) -> String {
    let entities = &command.entities;
    let brand_suffix = entities.brand.as_ref().map(|brand| format!(" for {brand}")).unwrap_or_default();

    match command.intent {
        IntentId::QueryUnpaid => {
            let mut summary =
                format!("Found {count} unpaid {}", plural(count, "invoice", "invoices"));
            if let Some(amount) = entities.amount {
                summary.push_str(&format!(" over ${}", format_money(amount)));
            }
            summary.push_str(&brand_suffix);
            if let Some(days) = entities.days {
                summary.push_str(&format!(" at least {days} days past due"));
            }
            summary
        }
        IntentId::QueryLowStock => {
            let days = entities.days.unwrap_or(config.low_stock_days);
            format!(
                "Found {count} {} with {days} days or less of stock{brand_suffix}",
                plural(count, "store", "stores")
            )
        }
        IntentId::QueryInactiveStores => {
            let days = entities.days.unwrap_or(config.inactive_store_days);
            format!("Found {count} {} with no orders in {days}+ days", plural(count, "store", "stores"))
        }
        IntentId::QueryDeliveries => {
            let (start, end) = delivery_period(entities, today);
            let period = if start != end {
                format!("from {start} to {end}")
            } else if start == today {
                "for today".to_string()
            } else {
                format!("for {start}")
            };
            format!("Found {count} delivery {} {period}", plural(count, "route", "routes"))
        }
        IntentId::QueryDrivers => {
            let status = if entities.status.as_deref() == Some("inactive") { "inactive" } else { "active" };
            format!(
                "Found {count} {status} {}, lowest on-time rate first",
                plural(count, "driver", "drivers")
            )
        }
        IntentId::QueryAmbassadors => match ambassador_inactivity(entities, config) {
            Some(days) => format!(
                "Found {count} {} inactive for {days}+ days",
                plural(count, "ambassador", "ambassadors")
            ),
            None => format!("Found {count} {}", plural(count, "ambassador", "ambassadors")),
        },
        IntentId::QueryProduction => format!(
            "Found {count} production {} in the queue{brand_suffix}",
            plural(count, "batch", "batches")
        ),
        IntentId::QueryTopStores => {
            format!("Top {count} {} by monthly volume", plural(count, "store", "stores"))
        }
        IntentId::QueryFollowups => {
            let days = entities.days.unwrap_or(config.followup_gap_days);
            format!(
                "Found {count} {} not contacted in {days}+ days",
                plural(count, "store", "stores")
            )
        }
        IntentId::QueryWholesale => format!(
            "Found {count} wholesale {}{brand_suffix}",
            plural(count, "listing", "listings")
        ),
        IntentId::ShowHelp => format!("Available shortcuts: {}", all_shortcuts().join(", ")),
        IntentId::Unknown => UNRECOGNIZED_SUMMARY.to_string(),
    }
}

fn present(kind: ResultKind, title: Render, subtitle: Render, record: Record) -> Option<QueryResult> {
    let id = record_id(&record)?.to_string();
    let title = title(&record).unwrap_or_else(|| id.clone());
    let subtitle = subtitle(&record);
    Some(QueryResult { id, kind, title, subtitle, data: record })
}

fn with_brand(query: RecordQuery, entities: &CommandEntities) -> RecordQuery {
    match &entities.brand {
        Some(brand) => query.filter("brand", FilterOp::Eq(json!(brand))),
        None => query,
    }
}

/// Explicit inactivity wording or a day count turns the roster into a stale list.
fn ambassador_inactivity(entities: &CommandEntities, config: &EngineConfig) -> Option<u32> {
    match (entities.days, entities.status.as_deref()) {
        (Some(days), _) => Some(days),
        (None, Some("inactive")) => Some(config.ambassador_inactive_days),
        _ => None,
    }
}

fn delivery_period(entities: &CommandEntities, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = entities.date.unwrap_or(today);
    (start, entities.date_end.unwrap_or(start))
}

fn days_before(today: NaiveDate, days: u32) -> NaiveDate {
    today.checked_sub_signed(Duration::days(i64::from(days))).unwrap_or(NaiveDate::MIN)
}

fn date_value(date: NaiveDate) -> Value {
    Value::String(date.format("%Y-%m-%d").to_string())
}

fn plural<'a>(count: usize, singular: &'a str, plural: &'a str) -> &'a str {
    if count == 1 {
        singular
    } else {
        plural
    }
}

fn format_money(amount: Decimal) -> String {
    if amount.fract().is_zero() {
        amount.trunc().normalize().to_string()
    } else {
        format!("{:.2}", amount)
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

fn joined(parts: Vec<Option<String>>) -> Option<String> {
    let parts: Vec<String> = parts.into_iter().flatten().collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" · "))
    }
}

fn text(record: &Record, field: &str) -> Option<String> {
    record_str(record, field).map(str::to_string)
}

fn name_title(record: &Record) -> Option<String> {
    text(record, "name").or_else(|| text(record, "store_name"))
}

fn store_title(record: &Record) -> Option<String> {
    text(record, "store_name").or_else(|| text(record, "name"))
}

fn batch_title(record: &Record) -> Option<String> {
    text(record, "brand").map(|brand| format!("{brand} batch"))
}

fn invoice_subtitle(record: &Record) -> Option<String> {
    joined(vec![
        record_f64(record, "amount").map(|amount| format!("${}", format_number(amount))),
        text(record, "due_date").map(|due| format!("due {due}")),
        text(record, "status"),
    ])
}

fn inventory_subtitle(record: &Record) -> Option<String> {
    joined(vec![
        text(record, "brand"),
        record_f64(record, "tubes_left").map(|tubes| {
            format!("{} {} left", format_number(tubes), if tubes == 1.0 { "tube" } else { "tubes" })
        }),
        record_f64(record, "days_until_empty").map(|days| {
            format!("{} {} of stock", format_number(days), if days == 1.0 { "day" } else { "days" })
        }),
    ])
}

fn last_order_subtitle(record: &Record) -> Option<String> {
    Some(match text(record, "last_order_date") {
        Some(date) => format!("Last order {date}"),
        None => "No orders on record".to_string(),
    })
}

fn last_contact_subtitle(record: &Record) -> Option<String> {
    Some(match text(record, "last_contact_date") {
        Some(date) => format!("Last contact {date}"),
        None => "Never contacted".to_string(),
    })
}

fn route_subtitle(record: &Record) -> Option<String> {
    joined(vec![
        text(record, "driver_name").or_else(|| Some("Unassigned".to_string())),
        record_f64(record, "stop_count").map(|stops| format!("{} stops", format_number(stops))),
        text(record, "date"),
        text(record, "status"),
    ])
}

fn driver_subtitle(record: &Record) -> Option<String> {
    joined(vec![
        record_f64(record, "on_time_rate").map(|rate| format!("{:.0}% on time", rate * 100.0)),
        record_f64(record, "deliveries_completed")
            .map(|count| format!("{} deliveries", format_number(count))),
        record_f64(record, "complaints")
            .filter(|count| *count > 0.0)
            .map(|count| format!("{} complaints", format_number(count))),
    ])
}

fn ambassador_subtitle(record: &Record) -> Option<String> {
    joined(vec![
        text(record, "last_activity_date").map(|date| format!("Last active {date}")),
        record_f64(record, "stores_signed")
            .map(|count| format!("{} stores signed", format_number(count))),
    ])
}

fn batch_subtitle(record: &Record) -> Option<String> {
    joined(vec![
        record_f64(record, "quantity").map(|quantity| format!("{} units", format_number(quantity))),
        text(record, "status"),
        text(record, "scheduled_for").map(|date| format!("scheduled {date}")),
    ])
}

fn volume_subtitle(record: &Record) -> Option<String> {
    joined(vec![
        record_f64(record, "monthly_volume")
            .map(|volume| format!("${}/mo", format_number(volume))),
        text(record, "neighborhood"),
    ])
}

fn wholesale_subtitle(record: &Record) -> Option<String> {
    joined(vec![
        text(record, "brand"),
        record_f64(record, "price").map(|price| format!("${}", format_number(price))),
        record_f64(record, "quantity").map(|quantity| format!("{} available", format_number(quantity))),
        text(record, "status"),
    ])
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;

    use super::{CommandEngine, UNRECOGNIZED_SUMMARY};
    use crate::commands::registry::intent_by_id;
    use crate::config::EngineConfig;
    use crate::domain::command::{CommandStatus, IntentId, ResultKind};
    use crate::store::testing::{FakeStore, UnreachableStore};
    use crate::store::Collection;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 15, 30, 0).single().expect("valid timestamp")
    }

    async fn invoices() -> FakeStore {
        FakeStore::with(
            Collection::Invoices,
            vec![
                json!({ "id": "inv-1", "store_name": "Corner Deli", "brand": "Grabba R", "amount": 450.0, "status": "unpaid", "due_date": "2026-09-20" }),
                json!({ "id": "inv-2", "store_name": "Uptown Smoke", "brand": "Hot Mama", "amount": 1200.0, "status": "overdue", "due_date": "2026-08-30" }),
                json!({ "id": "inv-3", "store_name": "Bodega 9", "brand": "Grabba R", "amount": 120.0, "status": "unpaid", "due_date": "2026-10-10" }),
                json!({ "id": "inv-4", "store_name": "Lenox Mart", "brand": "Grabba R", "amount": 900.0, "status": "paid", "due_date": "2026-09-01" }),
            ],
        )
        .await
    }

    #[tokio::test]
    async fn unrecognized_text_completes_without_results() {
        let engine = CommandEngine::new(invoices().await, EngineConfig::default());

        let response = engine.process_command_at("what's the weather", now()).await;

        assert_eq!(response.status, CommandStatus::Completed);
        assert_eq!(response.command.intent, IntentId::Unknown);
        assert!(response.results.is_empty());
        assert!(response.suggested_actions.is_empty());
        assert_eq!(response.summary, UNRECOGNIZED_SUMMARY);
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn unpaid_query_applies_amount_filter_and_orders_by_amount() {
        let engine = CommandEngine::new(invoices().await, EngineConfig::default());

        let response = engine.process_command_at("show unpaid invoices over $300", now()).await;

        assert_eq!(response.status, CommandStatus::Completed);
        let ids: Vec<_> = response.results.iter().map(|result| result.id.as_str()).collect();
        assert_eq!(ids, ["inv-2", "inv-1"]);
        assert_eq!(response.summary, "Found 2 unpaid invoices over $300");
        assert_eq!(response.results[0].kind, ResultKind::Invoice);
        assert_eq!(response.results[0].title, "Uptown Smoke");
        assert_eq!(
            response.results[1].subtitle.as_deref(),
            Some("$450 · due 2026-09-20 · unpaid")
        );

        let definition = intent_by_id(IntentId::QueryUnpaid).expect("registered");
        assert_eq!(response.suggested_actions, definition.suggested_actions);
    }

    #[tokio::test]
    async fn unpaid_shortcut_honours_brand_and_day_entities() {
        let engine = CommandEngine::new(invoices().await, EngineConfig::default());

        let response = engine.process_command_at("/unpaid grabba r 14 days", now()).await;

        assert!(response.command.is_shortcut);
        let ids: Vec<_> = response.results.iter().map(|result| result.id.as_str()).collect();
        assert_eq!(ids, ["inv-1"]);
        assert_eq!(response.summary, "Found 1 unpaid invoice for Grabba R at least 14 days past due");
    }

    #[tokio::test]
    async fn low_stock_uses_configured_threshold_by_default() {
        let store = FakeStore::with(
            Collection::Inventory,
            vec![
                json!({ "id": "stock-1", "store_name": "Corner Deli", "brand": "Grabba R", "tubes_left": 4, "days_until_empty": 2 }),
                json!({ "id": "stock-2", "store_name": "Bodega 9", "brand": "Gas", "tubes_left": 30, "days_until_empty": 12 }),
                json!({ "id": "stock-3", "store_name": "Lenox Mart", "brand": "Gas", "tubes_left": 9, "days_until_empty": 5 }),
            ],
        )
        .await;
        let engine = CommandEngine::new(store, EngineConfig::default());

        let response = engine.process_command_at("/low", now()).await;

        let ids: Vec<_> = response.results.iter().map(|result| result.id.as_str()).collect();
        assert_eq!(ids, ["stock-1", "stock-3"]);
        assert_eq!(response.summary, "Found 2 stores with 5 days or less of stock");
        assert_eq!(
            response.results[0].subtitle.as_deref(),
            Some("Grabba R · 4 tubes left · 2 days of stock")
        );
    }

    #[tokio::test]
    async fn deliveries_this_week_span_monday_to_sunday() {
        let store = FakeStore::with(
            Collection::Routes,
            vec![
                json!({ "id": "route-1", "name": "Bronx Loop", "date": "2026-10-11", "status": "completed" }),
                json!({ "id": "route-2", "name": "Harlem Run", "date": "2026-10-12", "status": "completed" }),
                json!({ "id": "route-3", "name": "Queens East", "date": "2026-10-16", "status": "planned" }),
            ],
        )
        .await;
        let engine = CommandEngine::new(store, EngineConfig::default());

        let response = engine.process_command_at("deliveries this week", now()).await;

        let ids: Vec<_> = response.results.iter().map(|result| result.id.as_str()).collect();
        assert_eq!(ids, ["route-2", "route-3"]);
        assert_eq!(response.summary, "Found 2 delivery routes from 2026-10-12 to 2026-10-18");
    }

    #[tokio::test]
    async fn top_stores_are_capped_and_ranked_by_volume() {
        let stores = (0..15)
            .map(|index| json!({ "id": format!("store-{index}"), "name": format!("Store {index}"), "monthly_volume": index * 100 }))
            .collect();
        let engine =
            CommandEngine::new(FakeStore::with(Collection::Stores, stores).await, EngineConfig::default());

        let response = engine.process_command_at("/top", now()).await;

        assert_eq!(response.results.len(), 10);
        assert_eq!(response.results[0].id, "store-14");
        assert_eq!(response.summary, "Top 10 stores by monthly volume");
    }

    #[tokio::test]
    async fn help_lists_shortcuts_without_querying() {
        let engine = CommandEngine::new(UnreachableStore, EngineConfig::default());

        let response = engine.process_command_at("/help", now()).await;

        assert_eq!(response.status, CommandStatus::Completed);
        assert!(response.results.is_empty());
        assert!(response.summary.contains("/unpaid"));
        assert!(response.summary.contains("/wholesale"));
    }

    #[tokio::test]
    async fn store_failure_is_reported_on_the_response() {
        let engine = CommandEngine::new(UnreachableStore, EngineConfig::default());

        let response = engine.process_command_at("/drivers", now()).await;

        assert_eq!(response.status, CommandStatus::Error);
        assert!(response.results.is_empty());
        assert_eq!(response.summary, "Couldn't load driver performance.");
        assert_eq!(
            response.error.as_deref(),
            Some("store backend failure: connection refused")
        );
        assert!(!response.suggested_actions.is_empty());
    }

    #[tokio::test]
    async fn result_limit_from_config_caps_every_query() {
        let stores = (0..8)
            .map(|index| json!({ "id": format!("store-{index}"), "name": format!("Store {index}"), "last_contact_date": "2026-01-01" }))
            .collect();
        let config = EngineConfig { result_limit: 3, ..EngineConfig::default() };
        let engine = CommandEngine::new(FakeStore::with(Collection::Stores, stores).await, config);

        let response = engine.process_command_at("/followups", now()).await;

        assert_eq!(response.results.len(), 3);
        assert_eq!(response.summary, "Found 3 stores not contacted in 21+ days");
    }
}
