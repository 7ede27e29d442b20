//! `/global-lists`, `/global-lists/{id}/items/…` (spec §6, SPEC_FULL.md
//! supplemented feature 1, original_source `app/api/routes/global_lists.py`).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use promptgraph_db::global_lists;

use crate::auth::CurrentUser;
use crate::dto::{
    GlobalListCreateRequest, GlobalListItemCreateRequest, GlobalListItemResponse,
    GlobalListItemUpdateRequest, GlobalListResponse, GlobalListUpdateRequest,
};
use crate::error::{ApiError, Result};
use crate::state::AppState;

async fn owned_list(state: &AppState, id: i64, owner_id: i64) -> Result<promptgraph_core::model::GlobalList> {
    global_lists::get_by_id_and_owner(&state.pool, id, owner_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("global list not found or not owned by user".to_string()))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<GlobalListCreateRequest>,
) -> Result<(StatusCode, Json<GlobalListResponse>)> {
    let list = global_lists::create(&state.pool, user.id, &body.name, body.description.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(list.into())))
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<GlobalListResponse>>> {
    let lists = global_lists::list_by_owner(&state.pool, user.id).await?;
    Ok(Json(lists.into_iter().map(Into::into).collect()))
}

pub async fn get(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<GlobalListResponse>> {
    let list = owned_list(&state, id, user.id).await?;
    Ok(Json(list.into()))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<GlobalListUpdateRequest>,
) -> Result<Json<GlobalListResponse>> {
    owned_list(&state, id, user.id).await?;
    let list = global_lists::update(
        &state.pool,
        id,
        user.id,
        body.name.as_deref(),
        body.description.as_ref().map(|d| d.as_deref()),
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("global list not found or not owned by user".to_string()))?;
    Ok(Json(list.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<axum::http::StatusCode> {
    owned_list(&state, id, user.id).await?;
    global_lists::delete(&state.pool, id, user.id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

pub async fn create_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(list_id): Path<i64>,
    Json(body): Json<GlobalListItemCreateRequest>,
) -> Result<(StatusCode, Json<GlobalListItemResponse>)> {
    owned_list(&state, list_id, user.id).await?;
    let item = global_lists::add_item(&state.pool, list_id, &body.value, body.order).await?;
    Ok((StatusCode::CREATED, Json(item.into())))
}

pub async fn list_items(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(list_id): Path<i64>,
) -> Result<Json<Vec<GlobalListItemResponse>>> {
    let list = owned_list(&state, list_id, user.id).await?;
    Ok(Json(list.items.into_iter().map(Into::into).collect()))
}

pub async fn update_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((list_id, item_id)): Path<(i64, i64)>,
    Json(body): Json<GlobalListItemUpdateRequest>,
) -> Result<Json<GlobalListItemResponse>> {
    owned_list(&state, list_id, user.id).await?;
    let item = global_lists::update_item(&state.pool, item_id, list_id, body.value.as_deref(), body.order)
        .await?
        .ok_or_else(|| ApiError::NotFound("item not found in this list".to_string()))?;
    Ok(Json(item.into()))
}

pub async fn delete_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((list_id, item_id)): Path<(i64, i64)>,
) -> Result<axum::http::StatusCode> {
    owned_list(&state, list_id, user.id).await?;
    let removed = global_lists::remove_item(&state.pool, item_id, list_id).await?;
    if !removed {
        return Err(ApiError::NotFound("item not found in this list".to_string()));
    }
    Ok(axum::http::StatusCode::NO_CONTENT)
}
