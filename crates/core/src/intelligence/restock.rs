use serde::{Deserialize, Serialize};

/// Reported when nothing is being consumed.
pub const NO_CONSUMPTION_DAYS: i64 = 999;
const NO_CONSUMPTION_CONFIDENCE: f64 = 0.1;
const MIN_CONFIDENCE: f64 = 0.3;
const STALENESS_WINDOW_DAYS: f64 = 60.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestockUrgency {
    Critical,
    Urgent,
    Soon,
    Normal,
}

impl RestockUrgency {
    pub fn from_days(days: i64) -> Self {
        if days <= 2 {
            Self::Critical
        } else if days <= 5 {
            Self::Urgent
        } else if days <= 10 {
            Self::Soon
        } else {
            Self::Normal
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RestockPrediction {
    pub days_until_restock: i64,
    pub confidence: f64,
    pub urgency: RestockUrgency,
}

/// Days of stock left at the current burn rate. Confidence decays as the
/// last order gets older.
pub fn predict_restock(
    current_inventory: f64,
    avg_daily_consumption: f64,
    days_since_last_order: i64,
) -> RestockPrediction {
    // Also rejects NaN.
    if !(avg_daily_consumption > 0.0) {
        return RestockPrediction {
            days_until_restock: NO_CONSUMPTION_DAYS,
            confidence: NO_CONSUMPTION_CONFIDENCE,
            urgency: RestockUrgency::Normal,
        };
    }

    let days_until_restock = (current_inventory.max(0.0) / avg_daily_consumption).floor() as i64;
    let staleness = days_since_last_order.max(0) as f64 / STALENESS_WINDOW_DAYS;

    RestockPrediction {
        days_until_restock,
        confidence: (1.0 - staleness).max(MIN_CONFIDENCE),
        urgency: RestockUrgency::from_days(days_until_restock),
    }
}

#[cfg(test)]
mod tests {
    use super::{predict_restock, RestockUrgency, NO_CONSUMPTION_DAYS};

    #[test]
    fn days_are_floored_and_bucketed() {
        let prediction = predict_restock(23.0, 4.0, 6);
        assert_eq!(prediction.days_until_restock, 5);
        assert_eq!(prediction.urgency, RestockUrgency::Urgent);
        assert!((prediction.confidence - 0.9).abs() < 1e-9);

        assert_eq!(predict_restock(4.0, 2.0, 0).urgency, RestockUrgency::Critical);
        assert_eq!(predict_restock(20.0, 2.0, 0).urgency, RestockUrgency::Soon);
        assert_eq!(predict_restock(22.0, 2.0, 0).urgency, RestockUrgency::Normal);
    }

    #[test]
    fn stale_orders_bottom_out_confidence() {
        assert!((predict_restock(10.0, 1.0, 120).confidence - 0.3).abs() < 1e-9);
        assert!((predict_restock(10.0, 1.0, 42).confidence - 0.3).abs() < 1e-9);
    }

    #[test]
    fn zero_consumption_returns_sentinel() {
        for consumption in [0.0, -2.0, f64::NAN] {
            let prediction = predict_restock(40.0, consumption, 3);
            assert_eq!(prediction.days_until_restock, NO_CONSUMPTION_DAYS);
            assert_eq!(prediction.urgency, RestockUrgency::Normal);
            assert!((prediction.confidence - 0.1).abs() < 1e-9);
        }
    }
}
