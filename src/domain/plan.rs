use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{Scenario, SectorValues};

/// Caller-supplied input of one planning run. Never mutated once submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub horizon_days: u32,
    #[serde(default)]
    pub scenario: Scenario,
    /// Raw sector weights; unknown sector names are ignored when resolved.
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
    /// Raw constraint mapping; missing or non-numeric entries fall back to defaults.
    #[serde(default)]
    pub constraints: BTreeMap<String, Value>,
}

impl RunConfig {
    pub fn new(horizon_days: u32, scenario: Scenario) -> Self {
        Self {
            horizon_days,
            scenario,
            weights: BTreeMap::new(),
            constraints: BTreeMap::new(),
        }
    }

    pub fn with_weight(mut self, sector: impl Into<String>, weight: f64) -> Self {
        self.weights.insert(sector.into(), weight);
        self
    }

    pub fn with_constraint(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constraints.insert(key.into(), value.into());
        self
    }
}

/// One simulated day of a release plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub day_index: u32,
    pub ts: DateTime<Utc>,
    pub release_value: f64,
    pub sector_allocations: SectorValues,
    pub storage_projection: f64,
    pub risk_index: f64,
}

/// Rule-curve comparison reported next to the planned satisfaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineComparison {
    pub method: String,
    pub overall_satisfaction: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeoffLabel {
    Balanced,
    MaxSupply,
    MinRisk,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeoffPoint {
    pub label: TradeoffLabel,
    pub supply: f64,
    pub risk: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub overall_satisfaction: f64,
    pub satisfaction_by_sector: SectorValues,
    pub drought_risk: f64,
    pub flood_risk: f64,
    pub env_flow_compliance: f64,
    pub baseline: BaselineComparison,
    pub tradeoffs: Vec<TradeoffPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
}

/// Parameters recorded with a run: the resolved weights next to the raw constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunParams {
    pub horizon_days: u32,
    pub scenario: Scenario,
    pub weights: SectorValues,
    pub constraints: BTreeMap<String, Value>,
}

/// A persisted planning run. Its daily records are stored alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRun {
    pub id: Uuid,
    pub name: String,
    pub params: RunParams,
    pub status: RunStatus,
    pub summary: RunSummary,
    pub created_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}
