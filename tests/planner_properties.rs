use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use reservoir_release_planner::domain::{RunConfig, Scenario, Sector};
use reservoir_release_planner::forecast::Baselines;
use reservoir_release_planner::optimizer::allocation::simulate_day;
use reservoir_release_planner::optimizer::{
    plan_release, resolve_weights, Constraints, CorrectionMode, DayContext, PlanError, PlannerOptions,
};

fn pinned_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 17, 45, 12).unwrap()
}

fn scenario_strategy() -> impl Strategy<Value = Scenario> {
    prop_oneof![Just(Scenario::Wet), Just(Scenario::Normal), Just(Scenario::Dry)]
}

fn correction_strategy() -> impl Strategy<Value = CorrectionMode> {
    prop_oneof![Just(CorrectionMode::SinglePass), Just(CorrectionMode::FixedPoint)]
}

/// Whole-number bounds with `min_env_flow <= min_release <= max_release`
/// and `min_storage <= max_storage`.
fn bounds_strategy() -> impl Strategy<Value = (u32, u32, u32, u32, u32)> {
    (0u32..60, 0u32..80, 0u32..300, 0u32..600, 0u32..900).prop_map(
        |(env, extra_release, release_span, min_storage, storage_span)| {
            let min_release = env + extra_release;
            (
                env,
                min_release,
                min_release + release_span,
                min_storage,
                min_storage + storage_span,
            )
        },
    )
}

fn config_with(
    horizon: u32,
    scenario: Scenario,
    (env, min_release, max_release, min_storage, max_storage): (u32, u32, u32, u32, u32),
) -> RunConfig {
    RunConfig::new(horizon, scenario)
        .with_constraint("min_env_flow", env)
        .with_constraint("min_release", min_release)
        .with_constraint("max_release", max_release)
        .with_constraint("min_storage", min_storage)
        .with_constraint("max_storage", max_storage)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn plan_respects_release_bounds_and_floor(
        horizon in 1u32..=90,
        scenario in scenario_strategy(),
        correction in correction_strategy(),
        bounds in bounds_strategy(),
        inflow in 0.0f64..400.0,
        storage0 in 0.0f64..1500.0,
    ) {
        let config = config_with(horizon, scenario, bounds);
        let baselines = Baselines { inflow_base: inflow, storage0, ..Baselines::default() };
        let options = PlannerOptions { correction, ..PlannerOptions::default() };
        let outcome = plan_release(&config, &baselines, pinned_now(), &options).unwrap();

        let (env, min_release, max_release, _, _) = bounds;
        prop_assert_eq!(outcome.records.len(), horizon as usize);

        for (i, record) in outcome.records.iter().enumerate() {
            prop_assert_eq!(record.day_index, i as u32);
            prop_assert!(record.release_value >= f64::from(min_release));
            prop_assert!(record.release_value <= f64::from(max_release));
            prop_assert!(record.sector_allocations[&Sector::Environment] >= f64::from(env));
            let allocated: f64 = record.sector_allocations.values().sum();
            prop_assert!((allocated - record.release_value).abs() <= 0.003,
                "allocated {} vs release {}", allocated, record.release_value);
            prop_assert!((0.0..=1.0).contains(&record.risk_index));
        }

        let summary = &outcome.summary;
        prop_assert!((0.0..=1.0).contains(&summary.overall_satisfaction));
        prop_assert!((0.0..=1.0).contains(&summary.drought_risk));
        prop_assert!((0.0..=1.0).contains(&summary.flood_risk));
        for value in summary.satisfaction_by_sector.values() {
            prop_assert!((0.0..=1.0).contains(value));
        }
    }

    #[test]
    fn plan_is_deterministic(
        horizon in 1u32..=30,
        scenario in scenario_strategy(),
        bounds in bounds_strategy(),
    ) {
        let config = config_with(horizon, scenario, bounds)
            .with_weight("agriculture", 2.5)
            .with_weight("industry", 0.0);
        let options = PlannerOptions::default();
        let first = plan_release(&config, &Baselines::default(), pinned_now(), &options).unwrap();
        let second = plan_release(&config, &Baselines::default(), pinned_now(), &options).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn horizon_past_maximum_is_rejected(horizon in 91u32..1000) {
        let config = RunConfig::new(horizon, Scenario::Normal);
        let err = plan_release(&config, &Baselines::default(), pinned_now(), &PlannerOptions::default())
            .unwrap_err();
        let rejected = matches!(err, PlanError::HorizonOutOfRange { got, max: 90 } if got == horizon);
        prop_assert!(rejected, "unexpected error {:?}", err);
    }
}

#[test]
fn dry_scenario_brings_less_water_than_wet() {
    let baselines = Baselines::default();
    let constraints = Constraints::default();
    let weights = resolve_weights(&Default::default());

    let mean_inflow = |scenario: Scenario| {
        let ctx = DayContext {
            scenario,
            baselines: &baselines,
            constraints: &constraints,
            weights: &weights,
            correction: CorrectionMode::SinglePass,
        };
        let total: f64 = (0..14)
            .map(|day| simulate_day(day, baselines.storage0, &ctx).inflow)
            .sum();
        total / 14.0
    };

    let dry = mean_inflow(Scenario::Dry);
    let normal = mean_inflow(Scenario::Normal);
    let wet = mean_inflow(Scenario::Wet);
    assert!(dry < normal && normal < wet, "dry {dry}, normal {normal}, wet {wet}");
}

#[test]
fn default_week_on_empty_history() {
    let config = RunConfig::new(7, Scenario::Normal);
    let outcome = plan_release(&config, &Baselines::default(), pinned_now(), &PlannerOptions::default()).unwrap();

    let start = Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap();
    assert_eq!(outcome.records.len(), 7);
    for (i, record) in outcome.records.iter().enumerate() {
        assert_eq!(record.ts, start + Duration::days(i as i64));
        assert!(record.sector_allocations[&Sector::Environment] >= 22.0);
    }

    // Fallback demand (195/day) fits under the release ceiling.
    assert_eq!(outcome.records[0].release_value, 195.0);
    assert_eq!(outcome.summary.env_flow_compliance, 1.0);
    assert_eq!(outcome.summary.baseline.method, "traditional_rule_curve_mock");
}

#[test]
fn pinned_storage_bounds_terminate() {
    let config = RunConfig::new(20, Scenario::Wet)
        .with_constraint("min_storage", 500)
        .with_constraint("max_storage", 500);
    for correction in [CorrectionMode::SinglePass, CorrectionMode::FixedPoint] {
        let options = PlannerOptions { correction, ..PlannerOptions::default() };
        let outcome = plan_release(&config, &Baselines::default(), pinned_now(), &options).unwrap();
        assert_eq!(outcome.records.len(), 20);
    }
}

#[test]
fn inverted_release_bounds_are_rejected() {
    let config = RunConfig::new(5, Scenario::Normal)
        .with_constraint("min_release", 300)
        .with_constraint("max_release", 100);
    let err = plan_release(&config, &Baselines::default(), pinned_now(), &PlannerOptions::default())
        .unwrap_err();
    assert!(matches!(err, PlanError::InvertedBounds(_)));
}
