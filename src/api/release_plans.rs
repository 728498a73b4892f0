use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::{error::ApiError, response::ApiResponse},
    controller::AppState,
    domain::{DailyRecord, OptimizationRun},
    export::{render_csv, render_report, ReportMeta},
};

#[derive(Debug, Serialize)]
pub struct ReleasePlanResponse {
    pub run: OptimizationRun,
    pub rows: Vec<DailyRecord>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Report,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
}

async fn load_plan(state: &AppState, run_id: Uuid) -> Result<(OptimizationRun, Vec<DailyRecord>), ApiError> {
    let run = state
        .repos
        .runs
        .find(run_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Optimization run {} not found", run_id)))?;
    let rows = state.repos.runs.records(run_id).await?;
    Ok((run, rows))
}

/// GET /api/v1/release-plans/:id - Run with its daily rows
pub async fn get_release_plan(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ReleasePlanResponse>>, ApiError> {
    let (run, rows) = load_plan(&state, run_id).await?;
    Ok(Json(ApiResponse::success(ReleasePlanResponse { run, rows })))
}

/// GET /api/v1/release-plans/:id/export?format=csv|report
pub async fn export_release_plan(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let (run, rows) = load_plan(&state, run_id).await?;
    tracing::debug!(%run_id, format = ?query.format, rows = rows.len(), "Exporting release plan");

    let response = match query.format {
        ExportFormat::Csv => (
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=release-plan-{}.csv", run_id),
                ),
            ],
            render_csv(&rows),
        )
            .into_response(),
        ExportFormat::Report => (
            [
                (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=release-plan-{}.txt", run_id),
                ),
            ],
            render_report(&ReportMeta::from(&run), &rows, &state.report_layout()),
        )
            .into_response(),
    };
    Ok(response)
}
