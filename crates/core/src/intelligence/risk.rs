//! Additive per-store risk scoring.
//!
//! Points come from five independent signals and the total is clamped to 100:
//!
//! | signal                  | bands                             |
//! |-------------------------|-----------------------------------|
//! | unpaid balance          | >$500 +20, >$2000 +35, >$5000 +50 |
//! | days past due           | >14 +15, >30 +35, >45 +50         |
//! | days until restock      | <=10 +10, <=5 +20, <=2 +30        |
//! | days since last order   | >14 +5, >30 +15                   |
//! | days since last contact | >21 +10, >45 +15                  |

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::intelligence::{RiskLevel, StoreRiskProfile};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSignals {
    pub store_id: String,
    pub store_name: String,
    #[serde(default)]
    pub unpaid_balance: Decimal,
    #[serde(default)]
    pub days_past_due: Option<i64>,
    #[serde(default)]
    pub predicted_days_until_restock: Option<i64>,
    #[serde(default)]
    pub days_since_last_order: Option<i64>,
    #[serde(default)]
    pub days_since_last_contact: Option<i64>,
}

pub fn build_store_risk_profile(signals: &StoreSignals) -> StoreRiskProfile {
    let mut score = 0_u32;
    let mut factors = Vec::new();

    let balance = signals.unpaid_balance;
    let balance_points = if balance > Decimal::from(5000) {
        50
    } else if balance > Decimal::from(2000) {
        35
    } else if balance > Decimal::from(500) {
        20
    } else {
        0
    };
    if balance_points > 0 {
        score += balance_points;
        factors.push(format!("${balance} unpaid"));
    }

    if let Some(days) = signals.days_past_due {
        let points = if days > 45 {
            50
        } else if days > 30 {
            35
        } else if days > 14 {
            15
        } else {
            0
        };
        if points > 0 {
            score += points;
            factors.push(format!("{days} days past due"));
        }
    }

    if let Some(days) = signals.predicted_days_until_restock {
        let points = if days <= 2 {
            30
        } else if days <= 5 {
            20
        } else if days <= 10 {
            10
        } else {
            0
        };
        if points > 0 {
            score += points;
            factors.push(format!("Restock needed in {days} days"));
        }
    }

    if let Some(days) = signals.days_since_last_order {
        let points = if days > 30 {
            15
        } else if days > 14 {
            5
        } else {
            0
        };
        if points > 0 {
            score += points;
            factors.push(format!("No order in {days} days"));
        }
    }

    if let Some(days) = signals.days_since_last_contact {
        let points = if days > 45 {
            15
        } else if days > 21 {
            10
        } else {
            0
        };
        if points > 0 {
            score += points;
            factors.push(format!("No contact in {days} days"));
        }
    }

    let risk_score = score.min(100);
    StoreRiskProfile {
        store_id: signals.store_id.clone(),
        store_name: signals.store_name.clone(),
        risk_score,
        risk_level: RiskLevel::from_score(risk_score),
        factors,
        predicted_days_until_restock: signals.predicted_days_until_restock,
        unpaid_balance: signals.unpaid_balance,
        days_since_last_order: signals.days_since_last_order,
        communication_gap: signals.days_since_last_contact,
    }
}

/// Highest score first; equal scores keep input order.
pub fn build_store_risk_profiles(signals: &[StoreSignals]) -> Vec<StoreRiskProfile> {
    let mut profiles: Vec<StoreRiskProfile> = signals.iter().map(build_store_risk_profile).collect();
    profiles.sort_by(|left, right| right.risk_score.cmp(&left.risk_score));
    profiles
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{build_store_risk_profile, build_store_risk_profiles, StoreSignals};
    use crate::domain::intelligence::RiskLevel;

    fn store(id: &str) -> StoreSignals {
        StoreSignals {
            store_id: id.to_string(),
            store_name: format!("Store {id}"),
            ..StoreSignals::default()
        }
    }

    #[test]
    fn large_overdue_balance_is_maximum_risk() {
        let signals = StoreSignals {
            unpaid_balance: Decimal::from(5200),
            days_past_due: Some(50),
            ..store("s1")
        };

        let profile = build_store_risk_profile(&signals);

        assert_eq!(profile.risk_score, 100);
        assert_eq!(profile.risk_level, RiskLevel::Critical);
        assert_eq!(profile.factors, ["$5200 unpaid", "50 days past due"]);
    }

    #[test]
    fn score_is_clamped_when_every_signal_fires() {
        let signals = StoreSignals {
            unpaid_balance: Decimal::from(9000),
            days_past_due: Some(90),
            predicted_days_until_restock: Some(1),
            days_since_last_order: Some(40),
            days_since_last_contact: Some(60),
            ..store("s2")
        };

        let profile = build_store_risk_profile(&signals);

        assert_eq!(profile.risk_score, 100);
        assert_eq!(profile.factors.len(), 5);
        assert_eq!(profile.communication_gap, Some(60));
    }

    #[test]
    fn level_turns_critical_at_seventy() {
        // 35 + 20 + 10 + 5 = 70
        let at_seventy = StoreSignals {
            unpaid_balance: Decimal::from(2500),
            predicted_days_until_restock: Some(4),
            days_since_last_order: Some(20),
            days_since_last_contact: Some(30),
            ..store("s3")
        };
        assert_eq!(build_store_risk_profile(&at_seventy).risk_score, 70);
        assert_eq!(build_store_risk_profile(&at_seventy).risk_level, RiskLevel::Critical);

        // 35 + 20 + 10 = 65
        let below = StoreSignals { days_since_last_order: Some(3), ..at_seventy };
        assert_eq!(build_store_risk_profile(&below).risk_score, 65);
        assert_eq!(build_store_risk_profile(&below).risk_level, RiskLevel::High);
    }

    #[test]
    fn quiet_store_has_no_factors() {
        let profile = build_store_risk_profile(&StoreSignals {
            days_since_last_order: Some(3),
            days_since_last_contact: Some(5),
            ..store("s4")
        });

        assert_eq!(profile.risk_score, 0);
        assert_eq!(profile.risk_level, RiskLevel::Low);
        assert!(profile.factors.is_empty());
    }

    #[test]
    fn profiles_are_ranked_by_score_stably() {
        let signals = vec![
            StoreSignals { days_since_last_contact: Some(30), ..store("a") },
            StoreSignals { unpaid_balance: Decimal::from(6000), ..store("b") },
            StoreSignals { days_since_last_contact: Some(25), ..store("c") },
        ];

        let ids: Vec<_> = build_store_risk_profiles(&signals)
            .into_iter()
            .map(|profile| profile.store_id)
            .collect();
        assert_eq!(ids, ["b", "a", "c"]);
    }
}
