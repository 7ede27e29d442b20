//! `POST /runs`, `GET /runs/by_sequence/{sid}`, `GET /runs/{id}`,
//! `GET /runs/block_run/{id}` (spec §4.5, §6, original_source
//! `app/api/routes/runs.py`).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde_json::json;
use tokio::sync::Mutex;

use promptgraph_core::context;
use promptgraph_core::model::{Block, RunStatus};
use promptgraph_core::orchestrator::{self, BlockOutcome, RunObserver};
use promptgraph_db::{blocks, global_lists, runs, sequences, variables};

use crate::auth::CurrentUser;
use crate::dto::{BlockRunResponse, RunCreateRequest, RunResponse};
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Persists `BlockRun` rows as the orchestrator progresses through a
/// sequence, one committed write per status transition (spec §4.5
/// "Run-level transactions").
struct PersistingObserver<'a> {
    state: &'a AppState,
    run_id: i64,
    in_flight: Mutex<std::collections::HashMap<i64, i64>>,
}

#[async_trait::async_trait]
impl<'a> RunObserver for PersistingObserver<'a> {
    async fn on_block_started(&self, block: &Block) {
        match runs::create_block_run(
            &self.state.pool,
            self.run_id,
            Some(block.id),
            &block.name,
            block.config.block_type(),
            Utc::now(),
        )
        .await
        {
            Ok(block_run) => {
                self.in_flight.lock().await.insert(block.id, block_run.id);
            }
            Err(err) => {
                tracing::error!(block_id = block.id, error = %err, "failed to persist block-run start");
            }
        }
    }

    async fn on_block_completed(&self, block: &Block, outcome: &BlockOutcome) {
        let block_run_id = self.in_flight.lock().await.remove(&block.id);
        let Some(block_run_id) = block_run_id else {
            tracing::error!(block_id = block.id, "no in-flight block-run to complete");
            return;
        };

        let result = runs::complete_block_run(
            &self.state.pool,
            block_run_id,
            outcome.status,
            outcome.output.prompt_text.as_deref(),
            outcome.output.raw_llm_text.as_deref(),
            outcome.output.named_outputs.as_ref(),
            outcome.output.list_outputs.as_ref(),
            outcome.output.matrix_outputs.as_ref(),
            outcome.error_message.as_deref(),
            outcome.completed_at,
            None,
            None,
            None,
        )
        .await;

        if let Err(err) = result {
            tracing::error!(block_id = block.id, error = %err, "failed to persist block-run completion");
        }
    }
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<RunCreateRequest>,
) -> Result<(StatusCode, Json<RunResponse>)> {
    let sequence = sequences::get_by_id_and_owner(&state.pool, body.sequence_id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("sequence not found or not owned by user".to_string()))?;

    let run = runs::create(&state.pool, sequence.id, user.id, &body.input_overrides_json).await?;

    match execute_run(&state, &run, &sequence, &body.input_overrides_json).await {
        Ok(()) => {
            let updated = runs::get_by_id_and_owner(&state.pool, run.id, user.id)
                .await?
                .ok_or_else(|| ApiError::Internal("run vanished after execution".to_string()))?;
            let block_runs = runs::list_block_runs_for_run(&state.pool, run.id).await?;
            Ok((StatusCode::ACCEPTED, Json(RunResponse::new(updated, block_runs))))
        }
        Err(err) => {
            // Catastrophic failure of the orchestrator itself: best-effort
            // mark the run FAILED and surface 500 rather than leaving it
            // stuck PENDING/RUNNING (SPEC_FULL.md supplemented feature 5).
            tracing::error!(run_id = run.id, error = %err, "catastrophic failure executing run");
            let _ = runs::mark_terminal(
                &state.pool,
                run.id,
                RunStatus::Failed,
                Utc::now(),
                &json!({"error": "Execution failed catastrophically", "details": err.to_string()}),
            )
            .await;
            Err(ApiError::Internal(format!("failed to execute sequence: {err}")))
        }
    }
}

async fn execute_run(
    state: &AppState,
    run: &promptgraph_core::model::Run,
    sequence: &promptgraph_core::model::Sequence,
    input_overrides: &serde_json::Value,
) -> Result<()> {
    let started_at = Utc::now();
    runs::mark_running(&state.pool, run.id, started_at).await?;

    let seq_variables = variables::list_by_sequence(&state.pool, sequence.id).await?;
    let lists = global_lists::list_by_owner(&state.pool, sequence.owner_id).await?;
    let seed_context = context::build_context(&seq_variables, &lists, input_overrides);

    let seq_blocks = blocks::list_by_sequence(&state.pool, sequence.id).await?;

    if seq_blocks.is_empty() {
        runs::mark_terminal(&state.pool, run.id, RunStatus::Completed, Utc::now(), &json!({}))
            .await?;
        return Ok(());
    }

    let observer = PersistingObserver {
        state,
        run_id: run.id,
        in_flight: Mutex::new(std::collections::HashMap::new()),
    };

    let outcome = orchestrator::run_sequence(
        &seq_blocks,
        seed_context,
        state.llm_provider.as_ref(),
        &observer,
    )
    .await
    .map_err(ApiError::from)?;

    runs::mark_terminal(
        &state.pool,
        run.id,
        outcome.status,
        Utc::now(),
        &outcome.results_summary,
    )
    .await?;

    Ok(())
}

pub async fn list_for_sequence(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(sequence_id): Path<i64>,
) -> Result<Json<Vec<RunResponse>>> {
    sequences::get_by_id_and_owner(&state.pool, sequence_id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("sequence not found or not owned by user".to_string()))?;

    let mut out = Vec::new();
    for run in runs::list_by_sequence_and_owner(&state.pool, sequence_id, user.id).await? {
        let block_runs = runs::list_block_runs_for_run(&state.pool, run.id).await?;
        out.push(RunResponse::new(run, block_runs));
    }
    Ok(Json(out))
}

pub async fn get(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<RunResponse>> {
    let run = runs::get_by_id_and_owner(&state.pool, id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("run not found or not owned by user".to_string()))?;
    let block_runs = runs::list_block_runs_for_run(&state.pool, run.id).await?;
    Ok(Json(RunResponse::new(run, block_runs)))
}

pub async fn get_block_run(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<BlockRunResponse>> {
    let block_run = runs::get_block_run_for_owner(&state.pool, id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("block-run not found or access denied".to_string()))?;
    Ok(Json(block_run.into()))
}
