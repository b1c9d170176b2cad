//! Pure scoring, forecasting and alerting over supplied operational metrics.
//!
//! Nothing here performs I/O or reads the clock; timestamps are passed in.

pub mod alerts;
pub mod delivery;
pub mod demand;
pub mod drivers;
pub mod insights;
pub mod payment;
pub mod restock;
pub mod risk;
pub mod snapshot;

pub use alerts::{generate_smart_alerts, AlertInputs};
pub use delivery::detect_delivery_bottleneck;
pub use demand::forecast_brand_demand;
pub use drivers::score_driver_reliability;
pub use insights::{generate_insights, InsightInputs};
pub use payment::{calculate_payment_risk, PaymentHistory, PaymentRiskScore};
pub use restock::{predict_restock, RestockPrediction, RestockUrgency};
pub use risk::{build_store_risk_profile, build_store_risk_profiles, StoreSignals};
pub use snapshot::{build_snapshot, IntelligenceInputs};

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}
