//! Drives a sequence of blocks to completion.
//!
//! Each block runs in declared order, a failure is recorded against that
//! block alone and execution continues to the next block rather than
//! aborting the run, and the context is only updated with a block's
//! outputs when it succeeds — a failed block can't poison what later
//! blocks see.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use crate::error::Result;
use crate::executor::{self, BlockExecutionOutput};
use crate::llm::LlmProvider;
use crate::model::{Block, BlockType, RunStatus};

/// Persistence hook invoked as the orchestrator progresses, so the caller
/// can flush `BlockRun` rows without the engine depending on a storage
/// backend directly.
#[async_trait]
pub trait RunObserver: Send + Sync {
    async fn on_block_started(&self, block: &Block);
    async fn on_block_completed(&self, block: &Block, outcome: &BlockOutcome);
}

#[derive(Debug, Clone)]
pub struct BlockOutcome {
    pub block_id: i64,
    pub block_name: String,
    pub block_type: BlockType,
    pub status: RunStatus,
    pub output: BlockExecutionOutput,
    /// The name→value entries this block merged into the context on
    /// success; empty for a failed block. Keyed into `results_summary`.
    pub output_additions: Value,
    pub error_message: Option<String>,
    pub started_at: chrono::DateTime<Utc>,
    pub completed_at: chrono::DateTime<Utc>,
}

pub struct SequenceOutcome {
    pub status: RunStatus,
    pub block_outcomes: Vec<BlockOutcome>,
    pub results_summary: Value,
}

/// Execute every block in `blocks` (already ordered) against `seed_context`,
/// reporting progress through `observer`.
pub async fn run_sequence(
    blocks: &[Block],
    seed_context: HashMap<String, Value>,
    provider: &dyn LlmProvider,
    observer: &dyn RunObserver,
) -> Result<SequenceOutcome> {
    let mut context = seed_context;
    let mut outcomes = Vec::with_capacity(blocks.len());
    let mut overall_success = true;

    tracing::info!(block_count = blocks.len(), "run execution started");

    for block in blocks {
        observer.on_block_started(block).await;
        let started_at = Utc::now();
        tracing::debug!(block_id = block.id, block_name = %block.name, "executing block");

        let outcome = match executor::execute_block(&block.config, &context, provider).await {
            Ok(output) => {
                let additions = merge_outputs(&mut context, &block.config, block.id, &output);
                BlockOutcome {
                    block_id: block.id,
                    block_name: block.name.clone(),
                    block_type: block.config.block_type(),
                    status: RunStatus::Completed,
                    output,
                    output_additions: Value::Object(additions),
                    error_message: None,
                    started_at,
                    completed_at: Utc::now(),
                }
            }
            Err(err) => {
                overall_success = false;
                tracing::warn!(block_id = block.id, error = %err, "block execution failed");
                BlockOutcome {
                    block_id: block.id,
                    block_name: block.name.clone(),
                    block_type: block.config.block_type(),
                    status: RunStatus::Failed,
                    output: BlockExecutionOutput::default(),
                    output_additions: Value::Object(serde_json::Map::new()),
                    error_message: Some(err.to_string()),
                    started_at,
                    completed_at: Utc::now(),
                }
            }
        };

        observer.on_block_completed(block, &outcome).await;
        outcomes.push(outcome);
    }

    let results_summary = build_results_summary(&outcomes);
    let status = if overall_success {
        RunStatus::Completed
    } else {
        RunStatus::Failed
    };

    tracing::info!(?status, "run execution finished");

    Ok(SequenceOutcome {
        status,
        block_outcomes: outcomes,
        results_summary,
    })
}

/// Merge a successful block's outputs into the running context under the
/// name(s) its config declares, returning the same name→value entries so
/// the caller can also record them against the block's results-summary
/// entry. Every block type produces exactly one of named/list/matrix
/// outputs, so at most one branch below ever fires.
fn merge_outputs(
    context: &mut HashMap<String, Value>,
    config: &crate::model::BlockConfig,
    block_id: i64,
    output: &BlockExecutionOutput,
) -> serde_json::Map<String, Value> {
    let mut additions = serde_json::Map::new();

    if let Some(Value::Object(named)) = &output.named_outputs {
        for (name, value) in named {
            additions.insert(name.clone(), value.clone());
        }
    }
    if let Some(list) = &output.list_outputs {
        additions.insert(config.output_list_variable_name_or(block_id), list.clone());
    }
    if let Some(matrix) = &output.matrix_outputs {
        additions.insert(config.output_matrix_variable_name_or(block_id), matrix.clone());
    }

    for (name, value) in &additions {
        context.insert(name.clone(), value.clone());
    }

    additions
}

/// `results_summary`, keyed `block_{id}_{name}` (spaces in the block name
/// become underscores) mapping to that block's output additions — only
/// successful blocks contribute an entry (spec §4.5 step 5).
fn build_results_summary(outcomes: &[BlockOutcome]) -> Value {
    let mut summary = serde_json::Map::new();
    for outcome in outcomes {
        if outcome.status != RunStatus::Completed {
            continue;
        }
        let key = format!(
            "block_{}_{}",
            outcome.block_id,
            outcome.block_name.replace(' ', "_")
        );
        summary.insert(key, outcome.output_additions.clone());
    }
    Value::Object(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::StubLlmProvider;
    use crate::model::BlockConfig;

    struct NoopObserver;

    #[async_trait]
    impl RunObserver for NoopObserver {
        async fn on_block_started(&self, _block: &Block) {}
        async fn on_block_completed(&self, _block: &Block, _outcome: &BlockOutcome) {}
    }

    fn block(id: i64, order: i64, config: BlockConfig) -> Block {
        Block {
            id,
            sequence_id: 1,
            name: format!("block-{id}"),
            order,
            config,
        }
    }

    #[tokio::test]
    async fn continues_past_a_failed_block() {
        let blocks = vec![
            block(
                1,
                0,
                BlockConfig::Standard {
                    prompt: "{{missing}}".to_string(),
                    output_variable_name: "a".to_string(),
                },
            ),
            block(
                2,
                1,
                BlockConfig::Standard {
                    prompt: "static prompt".to_string(),
                    output_variable_name: "b".to_string(),
                },
            ),
        ];
        let provider = StubLlmProvider::fixed("ok");
        let observer = NoopObserver;
        let outcome = run_sequence(&blocks, HashMap::new(), &provider, &observer)
            .await
            .unwrap();

        assert_eq!(outcome.status, RunStatus::Failed);
        assert_eq!(outcome.block_outcomes[0].status, RunStatus::Failed);
        assert_eq!(outcome.block_outcomes[1].status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn single_list_output_is_visible_to_the_next_block() {
        use serde_json::json;

        let blocks = vec![
            block(
                1,
                0,
                BlockConfig::SingleList {
                    prompt: "Say {{item}}!".to_string(),
                    input_list_variable_name: "animals".to_string(),
                    output_list_variable_name: Some("greetings".to_string()),
                },
            ),
            block(
                2,
                1,
                BlockConfig::Standard {
                    prompt: "Count: {{greetings}}".to_string(),
                    output_variable_name: "out".to_string(),
                },
            ),
        ];
        let mut seed = HashMap::new();
        seed.insert("animals".to_string(), json!(["cat", "dog"]));
        let provider = StubLlmProvider::fixed("ok");
        let observer = NoopObserver;
        let outcome = run_sequence(&blocks, seed, &provider, &observer).await.unwrap();

        assert_eq!(outcome.status, RunStatus::Completed);
        assert!(outcome.block_outcomes[1]
            .output
            .prompt_text
            .as_deref()
            .unwrap()
            .contains("cat"));
    }

    #[tokio::test]
    async fn successful_block_output_is_visible_to_the_next_block() {
        let blocks = vec![
            block(
                1,
                0,
                BlockConfig::Standard {
                    prompt: "first".to_string(),
                    output_variable_name: "greeting".to_string(),
                },
            ),
            block(
                2,
                1,
                BlockConfig::Standard {
                    prompt: "{{greeting}} again".to_string(),
                    output_variable_name: "second".to_string(),
                },
            ),
        ];
        let provider = StubLlmProvider::fixed("hi");
        let observer = NoopObserver;
        let outcome = run_sequence(&blocks, HashMap::new(), &provider, &observer)
            .await
            .unwrap();

        assert_eq!(outcome.status, RunStatus::Completed);
        assert_eq!(
            outcome.block_outcomes[1].output.prompt_text.as_deref(),
            Some("hi again")
        );
    }

    #[tokio::test]
    async fn results_summary_keys_successful_blocks_by_id_and_name() {
        let blocks = vec![
            block(
                1,
                0,
                BlockConfig::Standard {
                    prompt: "Hello {{name}}".to_string(),
                    output_variable_name: "greeting".to_string(),
                },
            ),
            block(
                2,
                1,
                BlockConfig::Standard {
                    prompt: "Echo: {{greeting}}".to_string(),
                    output_variable_name: "output".to_string(),
                },
            ),
        ];
        let mut seed = HashMap::new();
        seed.insert("name".to_string(), serde_json::json!("World"));
        let provider = StubLlmProvider::fixed("echoed");
        let observer = NoopObserver;
        let outcome = run_sequence(&blocks, seed, &provider, &observer).await.unwrap();

        assert_eq!(outcome.status, RunStatus::Completed);
        assert_eq!(
            outcome.results_summary,
            serde_json::json!({
                "block_1_block-1": {"greeting": "echoed"},
                "block_2_block-2": {"output": "echoed"},
            })
        );
    }

    #[tokio::test]
    async fn results_summary_omits_failed_blocks() {
        let blocks = vec![block(
            1,
            0,
            BlockConfig::Standard {
                prompt: "{{missing}}".to_string(),
                output_variable_name: "a".to_string(),
            },
        )];
        let provider = StubLlmProvider::fixed("ok");
        let observer = NoopObserver;
        let outcome = run_sequence(&blocks, HashMap::new(), &provider, &observer)
            .await
            .unwrap();

        assert_eq!(outcome.results_summary, serde_json::json!({}));
    }
}
