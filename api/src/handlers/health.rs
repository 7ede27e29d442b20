//! `GET /healthcheck` (spec §6, original_source `app/main.py`).

use axum::extract::State;
use axum::Json;

use crate::dto::HealthResponse;
use crate::state::AppState;

pub async fn healthcheck(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        project_name: state.config.project_name.clone(),
    })
}
