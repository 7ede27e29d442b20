//! `POST /engine/preview_prompt` (spec §4.6, §6, original_source
//! `app/api/routes/engine.py`).

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use promptgraph_core::{context, preview};
use promptgraph_db::{blocks, global_lists, variables};

use super::common::owned_sequence;
use crate::auth::CurrentUser;
use crate::dto::PreviewPromptResponse;
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Cap individual context values in the response so a large global list or
/// prior block placeholder doesn't bloat the preview payload (spec §4.6
/// step 6: "context_snapshot (truncated)").
const SNAPSHOT_VALUE_LIMIT: usize = 200;

pub async fn preview_prompt(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<crate::dto::PreviewPromptRequest>,
) -> Result<Json<PreviewPromptResponse>> {
    owned_sequence(&state, body.sequence_id, user.id).await?;

    let all_blocks = blocks::list_by_sequence(&state.pool, body.sequence_id).await?;
    let target = all_blocks
        .iter()
        .find(|b| b.id == body.block_id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound("block not found in this sequence".to_string()))?;

    let prior_blocks: Vec<_> = all_blocks
        .iter()
        .filter(|b| b.order < target.order || (b.order == target.order && b.id < target.id))
        .cloned()
        .collect();

    let seq_variables = variables::list_by_sequence(&state.pool, body.sequence_id).await?;
    let lists = global_lists::list_by_owner(&state.pool, user.id).await?;
    let overrides = body.input_overrides.unwrap_or_else(|| json!({}));
    let seed_context = context::build_context(&seq_variables, &lists, &overrides);

    let output = preview::preview_block(&target, &prior_blocks, &seed_context);

    Ok(Json(PreviewPromptResponse {
        block_id: target.id,
        block_name: target.name.clone(),
        block_type: target.config.block_type(),
        prompt_template: target.config.prompt().to_string(),
        rendered_prompt: output.rendered_prompt,
        error_message: output.error_message,
        context_snapshot: truncate_snapshot(&seed_context),
    }))
}

fn truncate_snapshot(context: &std::collections::HashMap<String, Value>) -> Value {
    let mut map = serde_json::Map::new();
    for (name, value) in context {
        let truncated = match value {
            Value::String(s) if s.chars().count() > SNAPSHOT_VALUE_LIMIT => {
                let head: String = s.chars().take(SNAPSHOT_VALUE_LIMIT).collect();
                Value::String(format!("{head}..."))
            }
            other => other.clone(),
        };
        map.insert(name.clone(), truncated);
    }
    Value::Object(map)
}
