//! Run and BlockRun persistence — each status write below is committed as
//! its own statement so an in-flight observer sees monotone progress.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use promptgraph_core::model::{BlockRun, BlockType, Run, RunStatus};
use serde_json::Value;
use sqlx::FromRow;

use crate::error::Result;
use crate::Pool;

#[derive(FromRow)]
struct RunRow {
    id: i64,
    sequence_id: i64,
    owner_id: i64,
    status: String,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    input_overrides_json: String,
    results_summary_json: String,
}

fn row_to_run(row: RunRow) -> sqlx::Result<Run> {
    Ok(Run {
        id: row.id,
        sequence_id: row.sequence_id,
        owner_id: row.owner_id,
        status: RunStatus::from_str(&row.status)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        started_at: row.started_at,
        completed_at: row.completed_at,
        input_overrides: serde_json::from_str(&row.input_overrides_json)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        results_summary: serde_json::from_str(&row.results_summary_json)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
    })
}

#[derive(FromRow)]
struct BlockRunRow {
    id: i64,
    run_id: i64,
    block_id: Option<i64>,
    block_name_snapshot: String,
    block_type_snapshot: String,
    status: String,
    prompt_text: Option<String>,
    raw_llm_text: Option<String>,
    named_outputs_json: Option<String>,
    list_outputs_json: Option<String>,
    matrix_outputs_json: Option<String>,
    error_message: Option<String>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    prompt_tokens: Option<i64>,
    completion_tokens: Option<i64>,
    cost_usd: Option<f64>,
}

fn row_to_block_run(row: BlockRunRow) -> sqlx::Result<BlockRun> {
    let parse_json = |raw: Option<String>| -> sqlx::Result<Option<Value>> {
        raw.map(|s| serde_json::from_str(&s).map_err(|e| sqlx::Error::Decode(Box::new(e))))
            .transpose()
    };

    Ok(BlockRun {
        id: row.id,
        run_id: row.run_id,
        block_id: row.block_id,
        block_name_snapshot: row.block_name_snapshot,
        block_type_snapshot: BlockType::from_str(&row.block_type_snapshot)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        status: RunStatus::from_str(&row.status).map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        prompt_text: row.prompt_text,
        raw_llm_text: row.raw_llm_text,
        named_outputs: parse_json(row.named_outputs_json)?,
        list_outputs: parse_json(row.list_outputs_json)?,
        matrix_outputs: parse_json(row.matrix_outputs_json)?,
        error_message: row.error_message,
        started_at: row.started_at,
        completed_at: row.completed_at,
        prompt_tokens: row.prompt_tokens,
        completion_tokens: row.completion_tokens,
        cost_usd: row.cost_usd,
    })
}

const RUN_COLUMNS: &str = "id, sequence_id, owner_id, status, started_at, completed_at, \
                            input_overrides_json, results_summary_json";
const BLOCK_RUN_COLUMNS: &str = "id, run_id, block_id, block_name_snapshot, block_type_snapshot, \
                                  status, prompt_text, raw_llm_text, named_outputs_json, \
                                  list_outputs_json, matrix_outputs_json, error_message, \
                                  started_at, completed_at, prompt_tokens, completion_tokens, cost_usd";

/// Create a PENDING run row, persisted before the orchestrator transitions
/// it to RUNNING.
pub async fn create(pool: &Pool, sequence_id: i64, owner_id: i64, input_overrides: &Value) -> Result<Run> {
    let input_overrides_json =
        serde_json::to_string(input_overrides).expect("Value always serializes");
    let row: RunRow = sqlx::query_as(&format!(
        "INSERT INTO runs (sequence_id, owner_id, status, input_overrides_json, results_summary_json)
         VALUES (?, ?, 'pending', ?, '{{}}')
         RETURNING {RUN_COLUMNS}"
    ))
    .bind(sequence_id)
    .bind(owner_id)
    .bind(input_overrides_json)
    .fetch_one(pool)
    .await?;

    Ok(row_to_run(row)?)
}

pub async fn mark_running(pool: &Pool, run_id: i64, started_at: DateTime<Utc>) -> Result<()> {
    sqlx::query("UPDATE runs SET status = 'running', started_at = ? WHERE id = ?")
        .bind(started_at)
        .bind(run_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn mark_terminal(
    pool: &Pool,
    run_id: i64,
    status: RunStatus,
    completed_at: DateTime<Utc>,
    results_summary: &Value,
) -> Result<()> {
    let results_summary_json = serde_json::to_string(results_summary).expect("Value always serializes");
    sqlx::query("UPDATE runs SET status = ?, completed_at = ?, results_summary_json = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(completed_at)
        .bind(results_summary_json)
        .bind(run_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn list_by_sequence_and_owner(pool: &Pool, sequence_id: i64, owner_id: i64) -> Result<Vec<Run>> {
    let rows: Vec<RunRow> = sqlx::query_as(&format!(
        "SELECT {RUN_COLUMNS} FROM runs WHERE sequence_id = ? AND owner_id = ? \
         ORDER BY started_at DESC, id DESC"
    ))
    .bind(sequence_id)
    .bind(owner_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(|r| Ok(row_to_run(r)?)).collect()
}

pub async fn get_by_id_and_owner(pool: &Pool, id: i64, owner_id: i64) -> Result<Option<Run>> {
    let row: Option<RunRow> = sqlx::query_as(&format!(
        "SELECT {RUN_COLUMNS} FROM runs WHERE id = ? AND owner_id = ?"
    ))
    .bind(id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;

    row.map(row_to_run).transpose().map_err(Into::into)
}

#[allow(clippy::too_many_arguments)]
pub async fn create_block_run(
    pool: &Pool,
    run_id: i64,
    block_id: Option<i64>,
    block_name_snapshot: &str,
    block_type_snapshot: BlockType,
    started_at: DateTime<Utc>,
) -> Result<BlockRun> {
    let row: BlockRunRow = sqlx::query_as(&format!(
        "INSERT INTO block_runs (run_id, block_id, block_name_snapshot, block_type_snapshot, status, started_at)
         VALUES (?, ?, ?, ?, 'running', ?)
         RETURNING {BLOCK_RUN_COLUMNS}"
    ))
    .bind(run_id)
    .bind(block_id)
    .bind(block_name_snapshot)
    .bind(block_type_snapshot.as_str())
    .bind(started_at)
    .fetch_one(pool)
    .await?;

    Ok(row_to_block_run(row)?)
}

/// Full set of fields the orchestrator fills in once a block finishes:
/// rendered prompt, raw LLM text, typed outputs, token usage, cost and
/// `completed_at`.
#[allow(clippy::too_many_arguments)]
pub async fn complete_block_run(
    pool: &Pool,
    block_run_id: i64,
    status: RunStatus,
    prompt_text: Option<&str>,
    raw_llm_text: Option<&str>,
    named_outputs: Option<&Value>,
    list_outputs: Option<&Value>,
    matrix_outputs: Option<&Value>,
    error_message: Option<&str>,
    completed_at: DateTime<Utc>,
    prompt_tokens: Option<i64>,
    completion_tokens: Option<i64>,
    cost_usd: Option<f64>,
) -> Result<()> {
    let to_json = |v: Option<&Value>| v.map(|v| serde_json::to_string(v).expect("Value always serializes"));

    sqlx::query(
        "UPDATE block_runs SET status = ?, prompt_text = ?, raw_llm_text = ?, named_outputs_json = ?, \
         list_outputs_json = ?, matrix_outputs_json = ?, error_message = ?, completed_at = ?, \
         prompt_tokens = ?, completion_tokens = ?, cost_usd = ? WHERE id = ?",
    )
    .bind(status.as_str())
    .bind(prompt_text)
    .bind(raw_llm_text)
    .bind(to_json(named_outputs))
    .bind(to_json(list_outputs))
    .bind(to_json(matrix_outputs))
    .bind(error_message)
    .bind(completed_at)
    .bind(prompt_tokens)
    .bind(completion_tokens)
    .bind(cost_usd)
    .bind(block_run_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// BlockRuns for `run_id`, ordered by `started_at` then `id`.
pub async fn list_block_runs_for_run(pool: &Pool, run_id: i64) -> Result<Vec<BlockRun>> {
    let rows: Vec<BlockRunRow> = sqlx::query_as(&format!(
        "SELECT {BLOCK_RUN_COLUMNS} FROM block_runs WHERE run_id = ? ORDER BY started_at ASC, id ASC"
    ))
    .bind(run_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(|r| Ok(row_to_block_run(r)?)).collect()
}

/// Fetch one BlockRun, scoped by the owner of its parent Run.
pub async fn get_block_run_for_owner(pool: &Pool, block_run_id: i64, owner_id: i64) -> Result<Option<BlockRun>> {
    let row: Option<BlockRunRow> = sqlx::query_as(&format!(
        "SELECT br.id, br.run_id, br.block_id, br.block_name_snapshot, br.block_type_snapshot, \
         br.status, br.prompt_text, br.raw_llm_text, br.named_outputs_json, br.list_outputs_json, \
         br.matrix_outputs_json, br.error_message, br.started_at, br.completed_at, \
         br.prompt_tokens, br.completion_tokens, br.cost_usd \
         FROM block_runs br JOIN runs r ON r.id = br.run_id \
         WHERE br.id = ? AND r.owner_id = ?"
    ))
    .bind(block_run_id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;

    row.map(row_to_block_run).transpose().map_err(Into::into)
}
