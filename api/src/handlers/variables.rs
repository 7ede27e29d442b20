//! `/variables`, `/variables/{id}`, `/variables/by_sequence/{sid}`,
//! `/variables/available_for_sequence/{sid}` (spec §6, §4.7,
//! original_source `app/api/routes/variables.py`).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

use promptgraph_core::resolver::{self};
use promptgraph_db::{blocks, global_lists, variables};

use super::common::owned_sequence;
use crate::auth::CurrentUser;
use crate::dto::{
    AvailableVariableResponse, VariableCreateRequest, VariableResponse, VariableUpdateRequest,
};
use crate::error::{ApiError, Result};
use crate::state::AppState;

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<VariableCreateRequest>,
) -> Result<(StatusCode, Json<VariableResponse>)> {
    owned_sequence(&state, body.sequence_id, user.id).await?;

    let payload = body.value_json.unwrap_or_else(|| json!({}));
    let variable = variables::create(
        &state.pool,
        body.sequence_id,
        &body.name,
        body.var_type,
        &payload,
        body.description.as_deref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(variable.into())))
}

pub async fn list_for_sequence(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(sequence_id): Path<i64>,
) -> Result<Json<Vec<VariableResponse>>> {
    owned_sequence(&state, sequence_id, user.id).await?;
    let variables = variables::list_by_sequence(&state.pool, sequence_id).await?;
    Ok(Json(variables.into_iter().map(Into::into).collect()))
}

pub async fn get(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<VariableResponse>> {
    let variable = variables::get_by_id_and_owner(&state.pool, id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("variable not found or not owned by user".to_string()))?;
    Ok(Json(variable.into()))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<VariableUpdateRequest>,
) -> Result<Json<VariableResponse>> {
    let existing = variables::get_by_id_and_owner(&state.pool, id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("variable not found or not owned by user".to_string()))?;

    let variable = variables::update(
        &state.pool,
        id,
        existing.sequence_id,
        body.name.as_deref(),
        body.value_json.as_ref(),
        body.description.as_ref().map(|d| d.as_deref()),
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("variable not found".to_string()))?;
    Ok(Json(variable.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<axum::http::StatusCode> {
    let existing = variables::get_by_id_and_owner(&state.pool, id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("variable not found or not owned by user".to_string()))?;

    variables::delete(&state.pool, id, existing.sequence_id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

/// `GET /variables/available_for_sequence/{sequence_id}` (spec §4.7).
pub async fn available_for_sequence(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(sequence_id): Path<i64>,
) -> Result<Json<Vec<AvailableVariableResponse>>> {
    owned_sequence(&state, sequence_id, user.id).await?;

    let seq_variables = variables::list_by_sequence(&state.pool, sequence_id).await?;
    let lists = global_lists::list_by_owner(&state.pool, user.id).await?;
    let seq_blocks = blocks::list_by_sequence(&state.pool, sequence_id).await?;

    let available = resolver::available_variables(&seq_variables, &lists, &seq_blocks);
    Ok(Json(available.into_iter().map(Into::into).collect()))
}
