use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::intelligence::{BusinessInsight, InsightCategory};
use crate::intelligence::round_to;

const BRAND_SWING_PERCENT: f64 = 10.0;
const COMPLETION_TARGET: f64 = 0.85;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BrandWeekSales {
    pub brand: String,
    pub this_week: f64,
    pub last_week: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeighborhoodVolume {
    pub neighborhood: String,
    pub volume: f64,
    pub store_count: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightInputs {
    #[serde(default)]
    pub brand_sales: Vec<BrandWeekSales>,
    #[serde(default)]
    pub neighborhoods: Vec<NeighborhoodVolume>,
    #[serde(default)]
    pub unpaid_total: Decimal,
    #[serde(default)]
    pub previous_unpaid_total: Option<Decimal>,
    #[serde(default)]
    pub delivery_completion_rate: Option<f64>,
    #[serde(default)]
    pub deliveries_observed: u64,
}

/// Emits an insight only when its trigger holds; missing evidence yields no entry.
pub fn generate_insights(inputs: &InsightInputs) -> Vec<BusinessInsight> {
    let mut insights = Vec::new();

    for sales in &inputs.brand_sales {
        if sales.last_week <= 0.0 {
            continue;
        }
        let change = (sales.this_week - sales.last_week) / sales.last_week * 100.0;
        if change.abs() <= BRAND_SWING_PERCENT {
            continue;
        }
        let direction = if change > 0.0 { "up" } else { "down" };
        insights.push(BusinessInsight {
            id: format!("insight-sales-{}", slug(&sales.brand)),
            category: InsightCategory::Sales,
            title: format!("{} {direction} {:.0}% week over week", sales.brand, change.abs()),
            description: format!(
                "{} orders this week against {} last week",
                sales.this_week, sales.last_week
            ),
            confidence: 0.8,
            data_points: 2,
        });
    }

    let total_volume: f64 = inputs.neighborhoods.iter().map(|area| area.volume).sum();
    let leader = inputs.neighborhoods.iter().fold(None::<&NeighborhoodVolume>, |best, area| match best {
        Some(best) if best.volume >= area.volume => Some(best),
        _ => Some(area),
    });
    if let Some(leader) = leader.filter(|leader| leader.volume > 0.0) {
        let share = round_to(leader.volume / total_volume * 100.0, 1);
        insights.push(BusinessInsight {
            id: format!("insight-geography-{}", slug(&leader.neighborhood)),
            category: InsightCategory::Geography,
            title: format!("{} leads volume", leader.neighborhood),
            description: format!(
                "${:.0} across {} stores, {share}% of tracked volume",
                leader.volume, leader.store_count
            ),
            confidence: (0.5 + 0.05 * inputs.neighborhoods.len() as f64).min(0.9),
            data_points: inputs.neighborhoods.iter().map(|area| area.store_count).sum(),
        });
    }

    if let Some(previous) = inputs.previous_unpaid_total {
        let delta = inputs.unpaid_total - previous;
        if !delta.is_zero() {
            let direction = if delta.is_sign_positive() { "up" } else { "down" };
            insights.push(BusinessInsight {
                id: "insight-financial-unpaid".to_string(),
                category: InsightCategory::Financial,
                title: format!("Unpaid balance {direction} ${}", delta.abs()),
                description: format!(
                    "Outstanding receivables moved from ${previous} to ${}",
                    inputs.unpaid_total
                ),
                confidence: 0.9,
                data_points: 2,
            });
        }
    }

    if let Some(rate) = inputs.delivery_completion_rate.filter(|rate| *rate < COMPLETION_TARGET) {
        insights.push(BusinessInsight {
            id: "insight-operations-completion".to_string(),
            category: InsightCategory::Operations,
            title: "Delivery completion below target".to_string(),
            description: format!(
                "{:.0}% of deliveries completed against an {:.0}% target",
                rate * 100.0,
                COMPLETION_TARGET * 100.0
            ),
            confidence: if inputs.deliveries_observed >= 20 { 0.85 } else { 0.6 },
            data_points: inputs.deliveries_observed,
        });
    }

    insights
}

fn slug(value: &str) -> String {
    value
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch.to_ascii_lowercase() } else { '-' })
        .collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{generate_insights, BrandWeekSales, InsightInputs, NeighborhoodVolume};
    use crate::domain::intelligence::InsightCategory;

    fn sales(brand: &str, this_week: f64, last_week: f64) -> BrandWeekSales {
        BrandWeekSales { brand: brand.to_string(), this_week, last_week }
    }

    #[test]
    fn quiet_inputs_produce_no_insights() {
        let inputs = InsightInputs {
            brand_sales: vec![sales("Gas", 105.0, 100.0), sales("Black", 20.0, 0.0)],
            unpaid_total: Decimal::from(1200),
            previous_unpaid_total: Some(Decimal::from(1200)),
            delivery_completion_rate: Some(0.9),
            ..InsightInputs::default()
        };

        assert!(generate_insights(&inputs).is_empty());
    }

    #[test]
    fn each_trigger_emits_one_insight() {
        let inputs = InsightInputs {
            brand_sales: vec![sales("Hot Mama", 130.0, 100.0), sales("Gas", 70.0, 100.0)],
            neighborhoods: vec![
                NeighborhoodVolume { neighborhood: "Harlem".to_string(), volume: 6000.0, store_count: 4 },
                NeighborhoodVolume { neighborhood: "Bronx".to_string(), volume: 9000.0, store_count: 6 },
            ],
            unpaid_total: Decimal::from(4300),
            previous_unpaid_total: Some(Decimal::from(3800)),
            delivery_completion_rate: Some(0.8),
            deliveries_observed: 40,
        };

        let insights = generate_insights(&inputs);

        let categories: Vec<_> = insights.iter().map(|insight| insight.category).collect();
        assert_eq!(
            categories,
            [
                InsightCategory::Sales,
                InsightCategory::Sales,
                InsightCategory::Geography,
                InsightCategory::Financial,
                InsightCategory::Operations,
            ]
        );
        assert_eq!(insights[0].title, "Hot Mama up 30% week over week");
        assert_eq!(insights[1].title, "Gas down 30% week over week");
        assert_eq!(insights[2].title, "Bronx leads volume");
        assert_eq!(insights[2].description, "$9000 across 6 stores, 60% of tracked volume");
        assert_eq!(insights[2].data_points, 10);
        assert_eq!(insights[3].title, "Unpaid balance up $500");
        assert_eq!(insights[4].data_points, 40);
        assert!((insights[4].confidence - 0.85).abs() < 1e-9);
    }
}
