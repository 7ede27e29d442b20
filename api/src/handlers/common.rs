//! Ownership-checking helpers shared by the resource handlers.
//!
//! Every handler that takes a caller-submitted sequence id re-derives
//! ownership here rather than trusting a cached parent reference.

use promptgraph_core::model::Sequence;
use promptgraph_db::sequences;

use crate::error::{ApiError, Result};
use crate::state::AppState;

pub async fn owned_sequence(state: &AppState, sequence_id: i64, owner_id: i64) -> Result<Sequence> {
    sequences::get_by_id_and_owner(&state.pool, sequence_id, owner_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("parent sequence not found or not owned by user".to_string())
        })
}
