//! `/sequences`, `/sequences/{id}` CRUD (spec §6, original_source
//! `app/api/routes/sequences.py`).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use promptgraph_db::{blocks, sequences, variables};

use crate::auth::CurrentUser;
use crate::dto::{SequenceCreateRequest, SequenceResponse, SequenceUpdateRequest};
use crate::error::{ApiError, Result};
use crate::state::AppState;

async fn to_response(state: &AppState, sequence: promptgraph_core::model::Sequence) -> Result<SequenceResponse> {
    let blocks = blocks::list_by_sequence(&state.pool, sequence.id).await?;
    let variables = variables::list_by_sequence(&state.pool, sequence.id).await?;
    Ok(SequenceResponse::new(sequence, blocks, variables))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<SequenceCreateRequest>,
) -> Result<(StatusCode, Json<SequenceResponse>)> {
    let sequence = sequences::create(&state.pool, user.id, &body.name, body.description.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(to_response(&state, sequence).await?)))
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<SequenceResponse>>> {
    let mut out = Vec::new();
    for sequence in sequences::list_by_owner(&state.pool, user.id).await? {
        out.push(to_response(&state, sequence).await?);
    }
    Ok(Json(out))
}

pub async fn get(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<SequenceResponse>> {
    let sequence = sequences::get_by_id_and_owner(&state.pool, id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("sequence not found or not owned by user".to_string()))?;
    Ok(Json(to_response(&state, sequence).await?))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<SequenceUpdateRequest>,
) -> Result<Json<SequenceResponse>> {
    let sequence = sequences::update(
        &state.pool,
        id,
        user.id,
        body.name.as_deref(),
        body.description.as_ref().map(|d| d.as_deref()),
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("sequence not found or not owned by user".to_string()))?;
    Ok(Json(to_response(&state, sequence).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<axum::http::StatusCode> {
    let deleted = sequences::delete(&state.pool, id, user.id).await?;
    if !deleted {
        return Err(ApiError::NotFound("sequence not found or not owned by user".to_string()));
    }
    Ok(axum::http::StatusCode::NO_CONTENT)
}
