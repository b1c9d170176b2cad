//! Assembles an `IntelligenceSnapshot` from raw operational inputs.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::intelligence::{IntelligenceSnapshot, SnapshotMetrics, TopStore};
use crate::intelligence::alerts::{
    AlertInputs, AmbassadorSignal, CommunicationGapSignal, DriverDelaySignal, LowStockSignal,
    ProductionGapSignal, UnpaidSignal,
};
use crate::intelligence::insights::{BrandWeekSales, InsightInputs, NeighborhoodVolume};
use crate::intelligence::restock::RestockUrgency;
use crate::intelligence::{
    build_store_risk_profiles, calculate_payment_risk, detect_delivery_bottleneck,
    forecast_brand_demand, generate_insights, generate_smart_alerts, predict_restock, round_to,
    score_driver_reliability, PaymentHistory, StoreSignals,
};

pub const TOP_STORES_LIMIT: usize = 10;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreActivity {
    pub store_id: String,
    pub store_name: String,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub monthly_volume: f64,
    #[serde(default)]
    pub unpaid_balance: Decimal,
    #[serde(default)]
    pub days_past_due: Option<i64>,
    #[serde(default)]
    pub days_since_last_order: Option<i64>,
    #[serde(default)]
    pub days_since_last_contact: Option<i64>,
    #[serde(default)]
    pub payment_history: PaymentHistory,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryLevel {
    pub store_id: String,
    pub store_name: String,
    #[serde(default)]
    pub brand: Option<String>,
    pub tubes_left: f64,
    pub avg_daily_consumption: f64,
    #[serde(default)]
    pub days_since_last_order: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriverActivity {
    pub driver_id: String,
    pub name: String,
    pub on_time_rate: f64,
    #[serde(default)]
    pub complaints: u32,
    #[serde(default)]
    pub deliveries_completed: u32,
    #[serde(default)]
    pub late_deliveries: u32,
    #[serde(default)]
    pub total_deliveries: u32,
    /// Per-period on-time rates, oldest first.
    #[serde(default)]
    pub period_scores: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BrandHistory {
    pub brand: String,
    /// Weekly order counts, oldest first.
    pub weekly_orders: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeliveryLoad {
    pub pending: u32,
    pub active_drivers: u32,
    pub avg_per_driver: f64,
    pub completion_rate: f64,
    #[serde(default)]
    pub completed: u64,
}

/// Everything the intelligence core needs for one run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IntelligenceInputs {
    #[serde(default)]
    pub stores: Vec<StoreActivity>,
    #[serde(default)]
    pub inventory: Vec<InventoryLevel>,
    #[serde(default)]
    pub ambassadors: Vec<AmbassadorSignal>,
    #[serde(default)]
    pub drivers: Vec<DriverActivity>,
    #[serde(default)]
    pub production: Vec<ProductionGapSignal>,
    #[serde(default)]
    pub brand_history: Vec<BrandHistory>,
    #[serde(default)]
    pub deliveries: Option<DeliveryLoad>,
    #[serde(default)]
    pub previous_unpaid_total: Option<Decimal>,
}

pub fn build_snapshot(inputs: &IntelligenceInputs, now: DateTime<Utc>) -> IntelligenceSnapshot {
    let mut restock_by_store: HashMap<&str, i64> = HashMap::new();
    let mut low_stock = Vec::new();
    for level in &inputs.inventory {
        let prediction =
            predict_restock(level.tubes_left, level.avg_daily_consumption, level.days_since_last_order);
        restock_by_store
            .entry(level.store_id.as_str())
            .and_modify(|days| *days = (*days).min(prediction.days_until_restock))
            .or_insert(prediction.days_until_restock);
        if prediction.urgency != RestockUrgency::Normal {
            low_stock.push(LowStockSignal {
                store_id: level.store_id.clone(),
                store_name: level.store_name.clone(),
                brand: level.brand.clone(),
                tubes_left: level.tubes_left,
                days_until_empty: prediction.days_until_restock,
            });
        }
    }

    let store_risks = build_store_risk_profiles(&store_signals(inputs, &restock_by_store));

    let alert_inputs = AlertInputs {
        low_stock,
        unpaid: inputs
            .stores
            .iter()
            .filter(|store| store.unpaid_balance > Decimal::ZERO)
            .filter_map(|store| {
                let days_past_due = store.days_past_due.filter(|days| *days > 0)?;
                Some(UnpaidSignal {
                    store_id: store.store_id.clone(),
                    store_name: store.store_name.clone(),
                    amount: store.unpaid_balance,
                    days_past_due,
                })
            })
            .collect(),
        inactive_ambassadors: inputs.ambassadors.clone(),
        late_drivers: inputs
            .drivers
            .iter()
            .filter(|driver| driver.late_deliveries > 0)
            .map(|driver| {
                let reliability = score_driver_reliability(
                    driver.on_time_rate,
                    driver.complaints,
                    driver.deliveries_completed,
                    &driver.period_scores,
                );
                DriverDelaySignal {
                    driver_id: driver.driver_id.clone(),
                    name: driver.name.clone(),
                    late_deliveries: driver.late_deliveries,
                    total_deliveries: driver.total_deliveries,
                    note: Some(format!(
                        "reliability {} ({})",
                        reliability.score,
                        trend_label(reliability.trend)
                    )),
                }
            })
            .collect(),
        production_gaps: inputs.production.clone(),
        communication_gaps: inputs
            .stores
            .iter()
            .filter_map(|store| {
                Some(CommunicationGapSignal {
                    store_id: store.store_id.clone(),
                    store_name: store.store_name.clone(),
                    days_since_contact: store.days_since_last_contact?,
                })
            })
            .collect(),
    };
    let alerts = generate_smart_alerts(&alert_inputs, now);

    let brand_forecasts = inputs
        .brand_history
        .iter()
        .map(|history| forecast_brand_demand(&history.brand, &history.weekly_orders))
        .collect();

    let total_unpaid: Decimal = inputs.stores.iter().map(|store| store.unpaid_balance).sum();
    let insights = generate_insights(&InsightInputs {
        brand_sales: inputs
            .brand_history
            .iter()
            .filter_map(|history| match history.weekly_orders.as_slice() {
                [.., last_week, this_week] => Some(BrandWeekSales {
                    brand: history.brand.clone(),
                    this_week: *this_week,
                    last_week: *last_week,
                }),
                _ => None,
            })
            .collect(),
        neighborhoods: neighborhood_volumes(&inputs.stores),
        unpaid_total: total_unpaid,
        previous_unpaid_total: inputs.previous_unpaid_total,
        delivery_completion_rate: inputs.deliveries.as_ref().map(|load| load.completion_rate),
        deliveries_observed: inputs.deliveries.as_ref().map_or(0, |load| load.completed),
    });

    let delivery_bottleneck = inputs.deliveries.as_ref().map(|load| {
        detect_delivery_bottleneck(
            load.pending,
            load.active_drivers,
            load.avg_per_driver,
            load.completion_rate,
        )
    });

    let risk_by_store: HashMap<&str, u32> = store_risks
        .iter()
        .map(|profile| (profile.store_id.as_str(), profile.risk_score))
        .collect();
    let top_stores_to_check = rank_top_stores(&inputs.stores, &risk_by_store);

    let metrics = SnapshotMetrics {
        active_stores: inputs.stores.len() as u64,
        total_unpaid,
        pending_deliveries: inputs.deliveries.as_ref().map_or(0, |load| u64::from(load.pending)),
        active_drivers: inputs
            .deliveries
            .as_ref()
            .map_or(inputs.drivers.len() as u64, |load| u64::from(load.active_drivers)),
        delivery_completion_rate: inputs.deliveries.as_ref().map(|load| load.completion_rate),
    };

    tracing::debug!(
        event_name = "intelligence.snapshot_built",
        alert_count = alerts.len(),
        store_risk_count = store_risks.len(),
        "intelligence snapshot built"
    );

    IntelligenceSnapshot {
        alerts,
        store_risks,
        brand_forecasts,
        insights,
        delivery_bottleneck,
        top_stores_to_check,
        metrics,
        generated_at: now,
    }
}

/// Known stores first, then stores only seen in inventory.
fn store_signals(
    inputs: &IntelligenceInputs,
    restock_by_store: &HashMap<&str, i64>,
) -> Vec<StoreSignals> {
    let mut signals: Vec<StoreSignals> = inputs
        .stores
        .iter()
        .map(|store| StoreSignals {
            store_id: store.store_id.clone(),
            store_name: store.store_name.clone(),
            unpaid_balance: store.unpaid_balance,
            days_past_due: store.days_past_due,
            predicted_days_until_restock: restock_by_store.get(store.store_id.as_str()).copied(),
            days_since_last_order: store.days_since_last_order,
            days_since_last_contact: store.days_since_last_contact,
        })
        .collect();

    for level in &inputs.inventory {
        if signals.iter().any(|signal| signal.store_id == level.store_id) {
            continue;
        }
        signals.push(StoreSignals {
            store_id: level.store_id.clone(),
            store_name: level.store_name.clone(),
            predicted_days_until_restock: restock_by_store.get(level.store_id.as_str()).copied(),
            ..StoreSignals::default()
        });
    }
    signals
}

/// Blends store risk, payment risk and volume into a visit priority.
fn rank_top_stores(stores: &[StoreActivity], risk_by_store: &HashMap<&str, u32>) -> Vec<TopStore> {
    let mut ranked: Vec<TopStore> = stores
        .iter()
        .map(|store| {
            let store_risk = f64::from(risk_by_store.get(store.store_id.as_str()).copied().unwrap_or(0));
            let payment = calculate_payment_risk(
                store.unpaid_balance,
                store.days_past_due.unwrap_or(0),
                &store.payment_history,
            );
            let volume = (store.monthly_volume / 50.0).clamp(0.0, 100.0);
            TopStore {
                store_id: store.store_id.clone(),
                store_name: store.store_name.clone(),
                priority_score: round_to(
                    0.5 * store_risk + 0.3 * f64::from(payment.score) + 0.2 * volume,
                    1,
                ),
            }
        })
        .filter(|store| store.priority_score > 0.0)
        .collect();

    ranked.sort_by(|left, right| {
        right.priority_score.partial_cmp(&left.priority_score).unwrap_or(Ordering::Equal)
    });
    ranked.truncate(TOP_STORES_LIMIT);
    ranked
}

fn neighborhood_volumes(stores: &[StoreActivity]) -> Vec<NeighborhoodVolume> {
    let mut volumes: Vec<NeighborhoodVolume> = Vec::new();
    for store in stores {
        let Some(neighborhood) = &store.neighborhood else {
            continue;
        };
        match volumes.iter_mut().find(|area| &area.neighborhood == neighborhood) {
            Some(area) => {
                area.volume += store.monthly_volume;
                area.store_count += 1;
            }
            None => volumes.push(NeighborhoodVolume {
                neighborhood: neighborhood.clone(),
                volume: store.monthly_volume,
                store_count: 1,
            }),
        }
    }
    volumes
}

fn trend_label(trend: crate::intelligence::drivers::ReliabilityTrend) -> &'static str {
    use crate::intelligence::drivers::ReliabilityTrend;
    match trend {
        ReliabilityTrend::Improving => "improving",
        ReliabilityTrend::Stable => "stable",
        ReliabilityTrend::Declining => "declining",
    }
}
