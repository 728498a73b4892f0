//! Daily allocation step
//!
//! Turns the baselines, scenario multipliers and constraints of one simulated
//! day into a release volume, a per-sector split of that release, the end of
//! day storage and a blended risk index. Values are kept at full precision
//! here; rounding happens only when a [`DailyRecord`] is emitted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::constraints::{clamp, Constraints};
use crate::domain::{round3, DailyRecord, Scenario, Sector, SectorValues};
use crate::forecast::Baselines;

/// Guards satisfaction against zero demand.
pub const SATISFACTION_EPSILON: f64 = 1e-6;
pub const DROUGHT_WEIGHT: f64 = 0.65;
pub const FLOOD_WEIGHT: f64 = 0.35;
/// Flood risk starts rising at this share of `max_storage`.
pub const FLOOD_ONSET_SHARE: f64 = 0.9;
/// Width of the flood ramp as a share of `max_storage`.
pub const FLOOD_RAMP_SHARE: f64 = 0.1;

const SEASON_BLOCK_DAYS: u32 = 14;
const SEASON_AMPLITUDE: f64 = 0.08;
/// Upper bound on correction passes in [`CorrectionMode::FixedPoint`].
pub const MAX_CORRECTION_PASSES: usize = 8;

/// How the storage floor and ceiling corrections are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionMode {
    /// Floor correction, then ceiling correction, each at most once. The floor
    /// is not re-checked after the ceiling correction.
    #[default]
    SinglePass,
    /// Repeat the corrections until storage sits inside both bounds or the
    /// release stops moving, bounded by [`MAX_CORRECTION_PASSES`].
    FixedPoint,
}

/// Everything one day needs besides the carried storage.
#[derive(Debug, Clone, Copy)]
pub struct DayContext<'a> {
    pub scenario: Scenario,
    pub baselines: &'a Baselines,
    pub constraints: &'a Constraints,
    pub weights: &'a SectorValues,
    pub correction: CorrectionMode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayOutcome {
    pub day_index: u32,
    pub inflow: f64,
    pub demands: SectorValues,
    pub release: f64,
    pub allocations: SectorValues,
    pub storage: f64,
    pub satisfaction: SectorValues,
    pub drought_risk: f64,
    pub flood_risk: f64,
    pub risk_index: f64,
}

impl DayOutcome {
    /// Emit the rounded record for this day.
    pub fn to_record(&self, ts: DateTime<Utc>) -> DailyRecord {
        DailyRecord {
            day_index: self.day_index,
            ts,
            release_value: round3(self.release),
            sector_allocations: self
                .allocations
                .iter()
                .map(|(s, v)| (*s, round3(*v)))
                .collect(),
            storage_projection: round3(self.storage),
            risk_index: round3(self.risk_index),
        }
    }
}

/// +8% for the first week of every two-week block, -8% for the second.
pub fn seasonal_multiplier(day_index: u32) -> f64 {
    if day_index % SEASON_BLOCK_DAYS < SEASON_BLOCK_DAYS / 2 {
        1.0 + SEASON_AMPLITUDE
    } else {
        1.0 - SEASON_AMPLITUDE
    }
}

/// Scenario-adjusted demand per sector, environment floored at `min_env_flow`.
pub fn sector_demands(demand_base: &SectorValues, scenario: Scenario, min_env_flow: f64) -> SectorValues {
    let multiplier = scenario.demand_multiplier();
    Sector::ALL
        .iter()
        .map(|s| {
            let base = demand_base
                .get(s)
                .copied()
                .unwrap_or_else(|| s.fallback_demand());
            let mut demand = base * multiplier;
            if *s == Sector::Environment {
                demand = demand.max(min_env_flow);
            }
            (*s, demand)
        })
        .collect()
}

/// Adjust the candidate release so the projected storage respects the bounds.
///
/// Returns `(release, projected_storage)`.
pub fn correct_for_storage(
    previous_storage: f64,
    inflow: f64,
    candidate: f64,
    constraints: &Constraints,
    mode: CorrectionMode,
) -> (f64, f64) {
    let available = previous_storage + inflow;
    let mut release = candidate;
    let mut projected = available - release;

    match mode {
        CorrectionMode::SinglePass => {
            if projected < constraints.min_storage {
                release = constraints.clamp_release(available - constraints.min_storage);
                projected = available - release;
            }
            if projected > constraints.max_storage {
                release = constraints.clamp_release(release + (projected - constraints.max_storage));
                projected = available - release;
            }
        }
        CorrectionMode::FixedPoint => {
            for _ in 0..MAX_CORRECTION_PASSES {
                let next = if projected < constraints.min_storage {
                    constraints.clamp_release(available - constraints.min_storage)
                } else if projected > constraints.max_storage {
                    constraints.clamp_release(release + (projected - constraints.max_storage))
                } else {
                    break;
                };
                if next == release {
                    break;
                }
                release = next;
                projected = available - release;
            }
        }
    }

    (release, projected)
}

pub fn weighted_demands(demands: &SectorValues, weights: &SectorValues) -> SectorValues {
    demands
        .iter()
        .map(|(s, d)| (*s, d * weights.get(s).copied().unwrap_or(1.0)))
        .collect()
}

/// Split `release` across `sectors` in proportion to their weighted demand.
/// Every sector gets zero when the group's weighted demand sums to zero.
fn split_proportionally(release: f64, weighted: &SectorValues, sectors: &[Sector]) -> SectorValues {
    let total: f64 = sectors.iter().filter_map(|s| weighted.get(s)).sum();
    sectors
        .iter()
        .map(|s| {
            let share = if total > 0.0 {
                release * weighted.get(s).copied().unwrap_or(0.0) / total
            } else {
                0.0
            };
            (*s, share)
        })
        .collect()
}

/// First allocation phase: the whole release split by weighted demand.
pub fn proportional_allocation(release: f64, weighted: &SectorValues) -> SectorValues {
    split_proportionally(release, weighted, &Sector::ALL)
}

/// Second allocation phase: force the environmental floor and share what is
/// left among the other sectors. Returns the allocation unchanged when the
/// environment already receives at least `min_env_flow`.
pub fn enforce_environment_floor(
    allocations: SectorValues,
    release: f64,
    weighted: &SectorValues,
    min_env_flow: f64,
) -> SectorValues {
    let environment = allocations.get(&Sector::Environment).copied().unwrap_or(0.0);
    if environment >= min_env_flow {
        return allocations;
    }

    let remaining = (release - min_env_flow).max(0.0);
    let mut floored = split_proportionally(remaining, weighted, &Sector::NON_ENVIRONMENT);
    floored.insert(Sector::Environment, min_env_flow);
    floored
}

pub fn satisfaction(allocations: &SectorValues, demands: &SectorValues) -> SectorValues {
    Sector::ALL
        .iter()
        .map(|s| {
            let allocated = allocations.get(s).copied().unwrap_or(0.0);
            let demand = demands.get(s).copied().unwrap_or(0.0).max(SATISFACTION_EPSILON);
            (*s, (allocated / demand).min(1.0))
        })
        .collect()
}

pub fn drought_risk(satisfaction: &SectorValues) -> f64 {
    if satisfaction.is_empty() {
        return 1.0;
    }
    let mean = satisfaction.values().sum::<f64>() / satisfaction.len() as f64;
    clamp(1.0 - mean, 0.0, 1.0)
}

/// Linear ramp: 0 at 90% of `max_storage`, 1 at 100%.
pub fn flood_risk(storage: f64, max_storage: f64) -> f64 {
    let onset = FLOOD_ONSET_SHARE * max_storage;
    let span = FLOOD_RAMP_SHARE * max_storage;
    if span <= 0.0 {
        return if storage >= max_storage { 1.0 } else { 0.0 };
    }
    clamp((storage - onset) / span, 0.0, 1.0)
}

pub fn risk_index(drought: f64, flood: f64) -> f64 {
    clamp(DROUGHT_WEIGHT * drought + FLOOD_WEIGHT * flood, 0.0, 1.0)
}

/// Simulate one day starting from `previous_storage`.
pub fn simulate_day(day_index: u32, previous_storage: f64, ctx: &DayContext<'_>) -> DayOutcome {
    let constraints = ctx.constraints;

    let inflow = ctx.baselines.inflow_base
        * ctx.scenario.inflow_multiplier()
        * seasonal_multiplier(day_index);
    let demands = sector_demands(&ctx.baselines.demand_base, ctx.scenario, constraints.min_env_flow);

    let target: f64 = demands.values().sum();
    let candidate = constraints.clamp_release(target);
    let (release, storage) =
        correct_for_storage(previous_storage, inflow, candidate, constraints, ctx.correction);

    let weighted = weighted_demands(&demands, ctx.weights);
    let allocations = enforce_environment_floor(
        proportional_allocation(release, &weighted),
        release,
        &weighted,
        constraints.min_env_flow,
    );

    let satisfaction = satisfaction(&allocations, &demands);
    let drought = drought_risk(&satisfaction);
    let flood = flood_risk(storage, constraints.max_storage);

    DayOutcome {
        day_index,
        inflow,
        demands,
        release,
        allocations,
        storage,
        satisfaction,
        drought_risk: drought,
        flood_risk: flood,
        risk_index: risk_index(drought, flood),
    }
}
