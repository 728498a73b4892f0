use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};

use crate::{
    api::{optimize, release_plans},
    controller::AppState,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/optimization/run", post(optimize::create_run))
        .route("/optimization/runs", get(optimize::list_runs))
        .route("/optimization/runs/:id", get(optimize::get_run))
        .route("/release-plans/:id", get(release_plans::get_release_plan))
        .route(
            "/release-plans/:id/export",
            get(release_plans::export_release_plan),
        )
        .route("/healthz", get(healthz))
        .with_state(state)
}

pub async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}
