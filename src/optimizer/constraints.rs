use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

use super::PlanError;
use crate::domain::{Sector, SectorValues};

/// Weight given to a sector the caller did not mention.
pub const DEFAULT_WEIGHT: f64 = 1.0;
/// Every sector keeps at least this weight.
pub const WEIGHT_FLOOR: f64 = 0.1;

/// Safety and operational bounds of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    pub min_env_flow: f64,
    pub min_release: f64,
    pub max_release: f64,
    pub min_storage: f64,
    pub max_storage: f64,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            min_env_flow: 22.0,
            min_release: 40.0,
            max_release: 260.0,
            min_storage: 280.0,
            max_storage: 1150.0,
        }
    }
}

impl Constraints {
    /// Resolve a raw, possibly partial mapping. Unknown keys are ignored and
    /// missing or non-numeric values take the default.
    pub fn resolve(raw: &BTreeMap<String, Value>) -> Self {
        let defaults = Self::default();
        let get = |key: &str, fallback: f64| raw.get(key).and_then(numeric).unwrap_or(fallback);
        Self {
            min_env_flow: get("min_env_flow", defaults.min_env_flow),
            min_release: get("min_release", defaults.min_release),
            max_release: get("max_release", defaults.max_release),
            min_storage: get("min_storage", defaults.min_storage),
            max_storage: get("max_storage", defaults.max_storage),
        }
    }

    /// Reject bounds whose lower end exceeds the upper end.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.min_release > self.max_release {
            return Err(PlanError::InvertedBounds(format!(
                "min_release {} exceeds max_release {}",
                self.min_release, self.max_release
            )));
        }
        if self.min_storage > self.max_storage {
            return Err(PlanError::InvertedBounds(format!(
                "min_storage {} exceeds max_storage {}",
                self.min_storage, self.max_storage
            )));
        }
        Ok(())
    }

    pub fn clamp_release(&self, release: f64) -> f64 {
        clamp(release, self.min_release, self.max_release)
    }
}

/// Lower bound wins when the range is empty, so this never panics.
pub fn clamp(value: f64, low: f64, high: f64) -> f64 {
    low.max(high.min(value))
}

fn numeric(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => f64::from_str(s.trim()).ok(),
        _ => None,
    }?;
    v.is_finite().then_some(v)
}

/// Complete the weight mapping for the four sectors.
pub fn resolve_weights(raw: &BTreeMap<String, f64>) -> SectorValues {
    let mut weights: SectorValues = Sector::ALL.iter().map(|s| (*s, DEFAULT_WEIGHT)).collect();
    for (name, weight) in raw {
        let Ok(sector) = Sector::from_str(name.trim()) else {
            continue;
        };
        if weight.is_finite() {
            weights.insert(sector, *weight);
        }
    }
    for weight in weights.values_mut() {
        *weight = weight.max(WEIGHT_FLOOR);
    }
    weights
}
