use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::intelligence::RiskLevel;

const THIN_HISTORY_TRANSACTIONS: u32 = 3;
const MAX_LATE_PROBABILITY: f64 = 0.95;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentHistory {
    pub total_transactions: u32,
    pub on_time_payments: u32,
}

impl PaymentHistory {
    /// Share of payments made on time; `None` without any history.
    pub fn on_time_ratio(&self) -> Option<f64> {
        if self.total_transactions == 0 {
            return None;
        }
        let on_time = self.on_time_payments.min(self.total_transactions);
        Some(f64::from(on_time) / f64::from(self.total_transactions))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentRiskScore {
    pub score: u32,
    pub level: RiskLevel,
    pub late_payment_probability: f64,
    pub factors: Vec<String>,
}

pub fn calculate_payment_risk(
    amount_owed: Decimal,
    days_overdue: i64,
    history: &PaymentHistory,
) -> PaymentRiskScore {
    let mut factors = Vec::new();

    let amount_points = if amount_owed > Decimal::from(5000) {
        30
    } else if amount_owed > Decimal::from(2000) {
        20
    } else if amount_owed > Decimal::from(500) {
        10
    } else {
        0
    };
    if amount_points > 0 {
        factors.push(format!("${amount_owed} owed"));
    }

    let overdue_points = if days_overdue > 60 {
        40
    } else if days_overdue > 30 {
        25
    } else if days_overdue > 14 {
        10
    } else {
        0
    };
    if overdue_points > 0 {
        factors.push(format!("{days_overdue} days overdue"));
    }

    let history_points = match history.on_time_ratio() {
        Some(ratio) if ratio >= 0.9 => 0,
        Some(ratio) if ratio >= 0.7 => 10,
        Some(ratio) if ratio >= 0.5 => 20,
        _ => 30,
    };
    if history_points > 0 {
        match history.on_time_ratio() {
            Some(ratio) => factors.push(format!("{:.0}% of payments on time", ratio * 100.0)),
            None => factors.push("No payment history".to_string()),
        }
    }

    let raw: u32 = amount_points + overdue_points + history_points;
    let score = if history.total_transactions < THIN_HISTORY_TRANSACTIONS {
        factors.push("Thin payment history, score dampened".to_string());
        // x0.7, rounded half up
        (raw * 7 + 5) / 10
    } else {
        raw
    };
    let score = score.min(100);

    PaymentRiskScore {
        score,
        level: RiskLevel::from_score(score),
        late_payment_probability: (f64::from(score) / 100.0).min(MAX_LATE_PROBABILITY),
        factors,
    }
}
