use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::{error::ApiError, response::ApiResponse},
    controller::AppState,
    domain::{OptimizationRun, RunConfig, Scenario},
};

const DEFAULT_LIST_LIMIT: usize = 50;
const MAX_LIST_LIMIT: usize = 200;

fn default_name() -> String {
    "Demo Optimization Run".to_string()
}

fn default_horizon() -> u32 {
    14
}

fn default_weights() -> BTreeMap<String, f64> {
    [
        ("drinking", 1.2),
        ("environment", 1.0),
        ("industry", 0.9),
        ("agriculture", 0.8),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn default_constraints() -> BTreeMap<String, Value> {
    [
        ("min_env_flow", json!(22)),
        ("min_release", json!(40)),
        ("max_release", json!(260)),
        ("min_storage", json!(280)),
        ("max_storage", json!(1150)),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Request to plan a new run
#[derive(Debug, Deserialize, Validate)]
pub struct OptimizationRunRequest {
    #[serde(default = "default_name")]
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default = "default_horizon")]
    #[validate(range(min = 1))]
    pub horizon_days: u32,
    #[serde(default)]
    pub scenario: Scenario,
    #[serde(default = "default_weights")]
    pub weights: BTreeMap<String, f64>,
    #[serde(default = "default_constraints")]
    pub constraints: BTreeMap<String, Value>,
}

impl OptimizationRunRequest {
    pub fn to_config(&self) -> RunConfig {
        RunConfig {
            horizon_days: self.horizon_days,
            scenario: self.scenario,
            weights: self.weights.clone(),
            constraints: self.constraints.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListRunsQuery {
    pub limit: Option<usize>,
}

/// POST /api/v1/optimization/run - Plan and store a run
pub async fn create_run(
    State(state): State<AppState>,
    Json(request): Json<OptimizationRunRequest>,
) -> Result<Json<ApiResponse<OptimizationRun>>, ApiError> {
    request.validate()?;
    tracing::info!(name = %request.name, horizon_days = request.horizon_days, "Planning run");

    let (run, _records) = state.planner.submit(&request.name, &request.to_config()).await?;
    Ok(Json(ApiResponse::success(run)))
}

/// GET /api/v1/optimization/runs - Most recent runs first
pub async fn list_runs(
    State(state): State<AppState>,
    Query(query): Query<ListRunsQuery>,
) -> Result<Json<ApiResponse<Vec<OptimizationRun>>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
    let runs = state.repos.runs.list(limit).await?;
    let count = runs.len();
    Ok(Json(ApiResponse::success(runs).with_count(count)))
}

/// GET /api/v1/optimization/runs/:id
pub async fn get_run(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OptimizationRun>>, ApiError> {
    let run = state
        .repos
        .runs
        .find(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Optimization run {} not found", id)))?;
    Ok(Json(ApiResponse::success(run)))
}
