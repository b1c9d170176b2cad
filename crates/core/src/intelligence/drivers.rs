use serde::{Deserialize, Serialize};

const TREND_DEADBAND: f64 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReliabilityTrend {
    Improving,
    Stable,
    Declining,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverReliability {
    pub score: u32,
    pub trend: ReliabilityTrend,
}

/// `period_scores` are per-period on-time rates in [0, 1], oldest first.
pub fn score_driver_reliability(
    on_time_rate: f64,
    complaints: u32,
    deliveries_completed: u32,
    period_scores: &[f64],
) -> DriverReliability {
    let volume_bonus = if deliveries_completed > 100 {
        10.0
    } else if deliveries_completed > 50 {
        5.0
    } else {
        0.0
    };
    let raw = on_time_rate.clamp(0.0, 1.0) * 80.0 - 5.0 * f64::from(complaints) + volume_bonus;

    DriverReliability { score: raw.round().clamp(0.0, 100.0) as u32, trend: trend(period_scores) }
}

fn trend(period_scores: &[f64]) -> ReliabilityTrend {
    if period_scores.len() < 3 {
        return ReliabilityTrend::Stable;
    }

    let (earlier, recent) = period_scores.split_at(period_scores.len() - 2);
    let delta = mean(recent) - mean(earlier);
    if delta > TREND_DEADBAND {
        ReliabilityTrend::Improving
    } else if delta < -TREND_DEADBAND {
        ReliabilityTrend::Declining
    } else {
        ReliabilityTrend::Stable
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
