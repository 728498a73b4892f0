//! Post-processing of a run summary.
//!
//! The rule-curve baseline and the three trade-off points are fixed offsets
//! from the planned result, not independently computed alternatives.

use crate::domain::{round3, BaselineComparison, TradeoffLabel, TradeoffPoint};

pub const BASELINE_METHOD: &str = "traditional_rule_curve_mock";
pub const BASELINE_SATISFACTION_OFFSET: f64 = 0.08;

const MAX_SUPPLY_GAIN: f64 = 0.04;
const MAX_SUPPLY_RISK_PENALTY: f64 = 0.08;
const MIN_RISK_SUPPLY_LOSS: f64 = 0.05;
const MIN_RISK_RISK_GAIN: f64 = 0.1;

pub fn baseline_comparison(overall_satisfaction: f64) -> BaselineComparison {
    let baseline = (overall_satisfaction - BASELINE_SATISFACTION_OFFSET).max(0.0);
    BaselineComparison {
        method: BASELINE_METHOD.to_string(),
        overall_satisfaction: round3(baseline),
        delta: round3(overall_satisfaction - baseline),
    }
}

pub fn tradeoff_points(overall_satisfaction: f64, drought_risk: f64, flood_risk: f64) -> Vec<TradeoffPoint> {
    let mean_risk = round3((drought_risk + flood_risk) / 2.0);
    vec![
        TradeoffPoint {
            label: TradeoffLabel::Balanced,
            supply: overall_satisfaction,
            risk: mean_risk,
        },
        TradeoffPoint {
            label: TradeoffLabel::MaxSupply,
            supply: round3((overall_satisfaction + MAX_SUPPLY_GAIN).min(1.0)),
            risk: round3((mean_risk + MAX_SUPPLY_RISK_PENALTY).min(1.0)),
        },
        TradeoffPoint {
            label: TradeoffLabel::MinRisk,
            supply: round3((overall_satisfaction - MIN_RISK_SUPPLY_LOSS).max(0.0)),
            risk: round3((mean_risk - MIN_RISK_RISK_GAIN).max(0.0)),
        },
    ]
}
