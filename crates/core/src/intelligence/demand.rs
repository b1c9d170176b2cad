use crate::domain::intelligence::{BrandDemandForecast, DemandTrend};
use crate::intelligence::round_to;

const TREND_THRESHOLD_PERCENT: f64 = 5.0;
const MAX_CONFIDENCE: f64 = 0.95;

/// Forecasts next-period demand from per-period order counts, oldest first.
///
/// Growth is the mean period-over-period change, or only the latest change
/// when fewer than three periods are known. Periods following a zero are
/// skipped because their relative change is undefined.
pub fn forecast_brand_demand(brand: &str, history: &[f64]) -> BrandDemandForecast {
    let current_period = history.last().copied().unwrap_or(0.0);
    let deltas: Vec<f64> = history
        .windows(2)
        .filter(|pair| pair[0] > 0.0)
        .map(|pair| (pair[1] - pair[0]) / pair[0])
        .collect();

    let growth = if history.len() < 3 {
        deltas.last().copied().unwrap_or(0.0)
    } else if deltas.is_empty() {
        0.0
    } else {
        deltas.iter().sum::<f64>() / deltas.len() as f64
    };
    let growth_rate = round_to(growth * 100.0, 2);

    let trend = if growth_rate > TREND_THRESHOLD_PERCENT {
        DemandTrend::Rising
    } else if growth_rate < -TREND_THRESHOLD_PERCENT {
        DemandTrend::Declining
    } else {
        DemandTrend::Stable
    };

    BrandDemandForecast {
        brand: brand.to_string(),
        current_period,
        next_period_prediction: (current_period * (1.0 + growth)).max(0.0).round(),
        growth_rate,
        trend,
        confidence: (0.5 + 0.1 * history.len() as f64).min(MAX_CONFIDENCE),
    }
}
