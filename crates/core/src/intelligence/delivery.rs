use crate::domain::intelligence::DeliveryBottleneck;
use crate::intelligence::round_to;

const OVERLOAD_RATIO: f64 = 1.2;
const MIN_COMPLETION_RATE: f64 = 0.7;
const CRITICAL_RATIO: f64 = 2.0;
const HIGH_LOAD_RATIO: f64 = 1.5;

/// Compares pending work to driver capacity. Capacity is floored at one
/// delivery so an idle fleet still yields a finite ratio.
pub fn detect_delivery_bottleneck(
    pending_deliveries: u32,
    active_drivers: u32,
    avg_deliveries_per_driver: f64,
    completion_rate: f64,
) -> DeliveryBottleneck {
    let capacity = (f64::from(active_drivers) * avg_deliveries_per_driver.max(0.0)).max(1.0);
    let ratio = f64::from(pending_deliveries) / capacity;
    let severity = (ratio * 50.0).round().min(100.0) as u32;

    let recommendation = if ratio > CRITICAL_RATIO {
        let needed = if avg_deliveries_per_driver > 0.0 {
            (f64::from(pending_deliveries) / avg_deliveries_per_driver).ceil() as u32
        } else {
            pending_deliveries
        };
        let shortfall = needed.saturating_sub(active_drivers).max(1);
        format!(
            "Critical overload: {pending_deliveries} pending deliveries need {shortfall} more {}",
            if shortfall == 1 { "driver" } else { "drivers" }
        )
    } else if ratio > HIGH_LOAD_RATIO {
        format!(
            "High load: {pending_deliveries} pending deliveries across {active_drivers} drivers. Rebalance routes or add a shift."
        )
    } else {
        format!(
            "Completion rate is {:.0}%. Review missed and late stops.",
            completion_rate * 100.0
        )
    };

    DeliveryBottleneck {
        is_bottleneck: ratio > OVERLOAD_RATIO || completion_rate < MIN_COMPLETION_RATE,
        capacity_ratio: round_to(ratio, 2),
        severity,
        recommendation,
    }
}
