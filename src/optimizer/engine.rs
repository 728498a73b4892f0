use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::allocation::{simulate_day, CorrectionMode, DayContext};
use super::constraints::{resolve_weights, Constraints};
use super::tradeoffs::{baseline_comparison, tradeoff_points};
use crate::domain::{round3, DailyRecord, RunConfig, RunSummary, Sector, SectorValues};
use crate::forecast::Baselines;

/// Longest horizon accepted by default.
pub const DEFAULT_MAX_HORIZON_DAYS: u32 = 90;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("horizon must be between 1 and {max} days, got {got}")]
    HorizonOutOfRange { got: u32, max: u32 },

    #[error("inverted bounds: {0}")]
    InvertedBounds(String),

    #[error("store error: {0}")]
    Source(#[from] anyhow::Error),
}

impl PlanError {
    /// True when the caller's configuration was refused before any day ran.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            PlanError::HorizonOutOfRange { .. } | PlanError::InvertedBounds(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerOptions {
    pub max_horizon_days: u32,
    pub correction: CorrectionMode,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            max_horizon_days: DEFAULT_MAX_HORIZON_DAYS,
            correction: CorrectionMode::default(),
        }
    }
}

/// Result of one planning run, before persistence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanOutcome {
    pub constraints: Constraints,
    pub weights: SectorValues,
    pub summary: RunSummary,
    pub records: Vec<DailyRecord>,
}

/// Midnight UTC of the day after `now`: the timestamp of day 0.
pub fn first_plan_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::default()).and_utc() + Duration::days(1)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Plan releases for `config.horizon_days` days starting the day after `now`.
///
/// Deterministic for identical inputs: `now` is only used to stamp records.
pub fn plan_release(
    config: &RunConfig,
    baselines: &Baselines,
    now: DateTime<Utc>,
    options: &PlannerOptions,
) -> Result<PlanOutcome, PlanError> {
    if config.horizon_days < 1 || config.horizon_days > options.max_horizon_days {
        return Err(PlanError::HorizonOutOfRange {
            got: config.horizon_days,
            max: options.max_horizon_days,
        });
    }

    let constraints = Constraints::resolve(&config.constraints);
    constraints.validate()?;
    let weights = resolve_weights(&config.weights);

    let ctx = DayContext {
        scenario: config.scenario,
        baselines,
        constraints: &constraints,
        weights: &weights,
        correction: options.correction,
    };

    let start = first_plan_day(now);
    let horizon = config.horizon_days as usize;
    let mut records = Vec::with_capacity(horizon);
    let mut satisfaction_series: Vec<SectorValues> = Vec::with_capacity(horizon);
    let mut drought_points = Vec::with_capacity(horizon);
    let mut flood_points = Vec::with_capacity(horizon);

    let mut storage = baselines.storage0;
    for day_index in 0..config.horizon_days {
        let day = simulate_day(day_index, storage, &ctx);
        debug!(
            day_index,
            release = day.release,
            storage = day.storage,
            risk_index = day.risk_index,
            "planned day"
        );

        records.push(day.to_record(start + Duration::days(i64::from(day_index))));
        drought_points.push(day.drought_risk);
        flood_points.push(day.flood_risk);
        storage = day.storage;
        satisfaction_series.push(day.satisfaction);
    }

    let summary = summarize(&satisfaction_series, &drought_points, &flood_points);
    info!(
        horizon_days = config.horizon_days,
        scenario = %config.scenario,
        overall_satisfaction = summary.overall_satisfaction,
        "release plan computed"
    );

    Ok(PlanOutcome {
        constraints,
        weights,
        summary,
        records,
    })
}

fn summarize(satisfaction_series: &[SectorValues], drought: &[f64], flood: &[f64]) -> RunSummary {
    let satisfaction_by_sector: SectorValues = Sector::ALL
        .iter()
        .map(|s| {
            let series: Vec<f64> = satisfaction_series
                .iter()
                .filter_map(|day| day.get(s).copied())
                .collect();
            (*s, round3(mean(&series)))
        })
        .collect();

    let per_sector: Vec<f64> = satisfaction_by_sector.values().copied().collect();
    let overall_satisfaction = round3(mean(&per_sector));
    let drought_risk = round3(mean(drought));
    let flood_risk = round3(mean(flood));

    RunSummary {
        overall_satisfaction,
        satisfaction_by_sector,
        drought_risk,
        flood_risk,
        env_flow_compliance: 1.0,
        baseline: baseline_comparison(overall_satisfaction),
        tradeoffs: tradeoff_points(overall_satisfaction, drought_risk, flood_risk),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Scenario;
    use chrono::TimeZone;

    fn pinned_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 17, 45, 12).unwrap()
    }

    #[test]
    fn test_first_plan_day_is_tomorrow_midnight() {
        let start = first_plan_day(pinned_now());
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_default_run_on_empty_history() {
        let config = RunConfig::new(7, Scenario::Normal);
        let outcome = plan_release(&config, &Baselines::default(), pinned_now(), &PlannerOptions::default()).unwrap();

        assert_eq!(outcome.records.len(), 7);
        for (i, pair) in outcome.records.windows(2).enumerate() {
            assert_eq!(pair[1].ts - pair[0].ts, Duration::days(1), "gap after day {i}");
        }
        for record in &outcome.records {
            assert!(record.release_value >= 40.0 && record.release_value <= 260.0);
        }
        assert_eq!(outcome.summary.env_flow_compliance, 1.0);
        assert_eq!(outcome.summary.tradeoffs.len(), 3);
    }

    #[test]
    fn test_horizon_bounds_rejected() {
        let options = PlannerOptions::default();
        let err = plan_release(&RunConfig::new(0, Scenario::Normal), &Baselines::default(), pinned_now(), &options)
            .unwrap_err();
        assert!(matches!(err, PlanError::HorizonOutOfRange { got: 0, max: 90 }));
        assert!(err.is_rejection());

        let err = plan_release(&RunConfig::new(91, Scenario::Normal), &Baselines::default(), pinned_now(), &options)
            .unwrap_err();
        assert!(matches!(err, PlanError::HorizonOutOfRange { got: 91, .. }));
    }

    #[test]
    fn test_inverted_bounds_rejected_before_running() {
        let config = RunConfig::new(5, Scenario::Dry)
            .with_constraint("min_release", 300)
            .with_constraint("max_release", 100);
        let err = plan_release(&config, &Baselines::default(), pinned_now(), &PlannerOptions::default())
            .unwrap_err();
        assert!(matches!(err, PlanError::InvertedBounds(_)));
    }

    #[test]
    fn test_equal_storage_bounds_terminate() {
        let config = RunConfig::new(30, Scenario::Wet)
            .with_constraint("min_storage", 700)
            .with_constraint("max_storage", 700);
        for correction in [CorrectionMode::SinglePass, CorrectionMode::FixedPoint] {
            let options = PlannerOptions {
                correction,
                ..PlannerOptions::default()
            };
            let outcome = plan_release(&config, &Baselines::default(), pinned_now(), &options).unwrap();
            assert_eq!(outcome.records.len(), 30);
        }
    }

    #[test]
    fn test_summary_derived_from_series() {
        let series = vec![
            crate::domain::sector_values(1.0),
            crate::domain::sector_values(0.5),
        ];
        let summary = summarize(&series, &[0.0, 0.5], &[0.2, 0.0]);
        assert_eq!(summary.overall_satisfaction, 0.75);
        assert_eq!(summary.satisfaction_by_sector[&Sector::Industry], 0.75);
        assert_eq!(summary.drought_risk, 0.25);
        assert_eq!(summary.flood_risk, 0.1);
        assert_eq!(summary.baseline.overall_satisfaction, 0.67);
        assert_eq!(summary.baseline.delta, 0.08);
    }

    #[test]
    fn test_release_below_environment_floor_goes_to_environment() {
        let config = RunConfig::new(3, Scenario::Normal)
            .with_constraint("min_env_flow", 100)
            .with_constraint("min_release", 60)
            .with_constraint("max_release", 60);
        let outcome = plan_release(&config, &Baselines::default(), pinned_now(), &PlannerOptions::default()).unwrap();

        for record in &outcome.records {
            assert_eq!(record.release_value, 60.0);
            assert_eq!(record.sector_allocations[&Sector::Environment], 100.0);
            for sector in Sector::NON_ENVIRONMENT {
                assert_eq!(record.sector_allocations[&sector], 0.0);
            }
            let allocated: f64 = record.sector_allocations.values().sum();
            assert!(allocated > record.release_value);
        }
    }

    #[test]
    fn test_resolved_weights_reported() {
        let config = RunConfig::new(3, Scenario::Normal).with_weight("drinking", 0.0);
        let outcome = plan_release(&config, &Baselines::default(), pinned_now(), &PlannerOptions::default()).unwrap();
        assert_eq!(outcome.weights[&Sector::Drinking], 0.1);
        assert_eq!(outcome.constraints, Constraints::default());
    }
}
