//! `/blocks`, `/blocks/{id}`, `/blocks/in_sequence/{sid}` CRUD.
//!
//! Every mutation re-derives the owning sequence and re-checks ownership
//! rather than trusting a cached parent.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use promptgraph_db::blocks;

use super::common::owned_sequence;
use crate::auth::CurrentUser;
use crate::dto::{BlockCreateRequest, BlockResponse, BlockUpdateRequest, DEFAULT_BLOCK_NAME};
use crate::error::{ApiError, Result};
use crate::state::AppState;

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<BlockCreateRequest>,
) -> Result<(StatusCode, Json<BlockResponse>)> {
    owned_sequence(&state, body.sequence_id, user.id).await?;
    body.config
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let name = body.name.unwrap_or_else(|| DEFAULT_BLOCK_NAME.to_string());
    let order = body.order.unwrap_or(0);
    let block = blocks::create(&state.pool, body.sequence_id, &name, order, &body.config).await?;
    Ok((StatusCode::CREATED, Json(block.into())))
}

pub async fn list_for_sequence(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(sequence_id): Path<i64>,
) -> Result<Json<Vec<BlockResponse>>> {
    owned_sequence(&state, sequence_id, user.id).await?;
    let blocks = blocks::list_by_sequence(&state.pool, sequence_id).await?;
    Ok(Json(blocks.into_iter().map(Into::into).collect()))
}

pub async fn get(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<BlockResponse>> {
    let block = blocks::get_by_id_and_owner(&state.pool, id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("block not found or not owned by user".to_string()))?;
    Ok(Json(block.into()))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<BlockUpdateRequest>,
) -> Result<Json<BlockResponse>> {
    let existing = blocks::get_by_id_and_owner(&state.pool, id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("block not found or not owned by user".to_string()))?;

    if let Some(config) = &body.config {
        config.validate().map_err(|e| ApiError::Validation(e.to_string()))?;
    }

    let block = blocks::update(
        &state.pool,
        id,
        existing.sequence_id,
        body.name.as_deref(),
        body.order,
        body.config.as_ref(),
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("block not found".to_string()))?;
    Ok(Json(block.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<axum::http::StatusCode> {
    let existing = blocks::get_by_id_and_owner(&state.pool, id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("block not found or not owned by user".to_string()))?;

    blocks::delete(&state.pool, id, existing.sequence_id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
