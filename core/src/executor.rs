//! Runs a single block against a context and an LLM provider.
//!
//! SingleList and MultiList fan out one LLM call per list item (or per
//! combination, for MultiList) concurrently, but the result vector is
//! always reassembled in source order — concurrency must never show up
//! as reordering.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde_json::Value;

use crate::error::{EngineError, Result};
use crate::llm::LlmProvider;
use crate::model::BlockConfig;
use crate::{discretize, template};

const FAN_OUT_CONCURRENCY: usize = 8;

/// Everything a block execution produces, shaped to slot directly into a
/// `BlockRun` row.
#[derive(Debug, Default, Clone)]
pub struct BlockExecutionOutput {
    pub prompt_text: Option<String>,
    pub raw_llm_text: Option<String>,
    pub named_outputs: Option<Value>,
    pub list_outputs: Option<Value>,
    pub matrix_outputs: Option<Value>,
}

pub async fn execute_block(
    config: &BlockConfig,
    context: &HashMap<String, Value>,
    provider: &dyn LlmProvider,
) -> Result<BlockExecutionOutput> {
    match config {
        BlockConfig::Standard {
            prompt,
            output_variable_name,
        } => {
            let rendered = template::render(prompt, context)?;
            let raw = provider.complete(&rendered).await?;
            let mut named = serde_json::Map::new();
            named.insert(output_variable_name.clone(), Value::String(raw.clone()));
            Ok(BlockExecutionOutput {
                prompt_text: Some(rendered),
                raw_llm_text: Some(raw),
                named_outputs: Some(Value::Object(named)),
                ..Default::default()
            })
        }

        BlockConfig::Discretization {
            prompt,
            output_names,
        } => {
            let rendered = template::render(prompt, context)?;
            let raw = provider.complete(&rendered).await?;
            let parts = discretize::discretize_output(&raw, output_names);
            let named: serde_json::Map<String, Value> = parts
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
            Ok(BlockExecutionOutput {
                prompt_text: Some(rendered),
                raw_llm_text: Some(raw),
                named_outputs: Some(Value::Object(named)),
                ..Default::default()
            })
        }

        BlockConfig::SingleList {
            prompt,
            input_list_variable_name,
            ..
        } => {
            let items = list_from_context(context, input_list_variable_name)?;
            let outputs = fan_out(&items, |item, index| {
                let mut item_ctx = context.clone();
                item_ctx.insert("item".to_string(), item.clone());
                item_ctx.insert("item_index".to_string(), Value::from(index));
                let rendered = template::render(prompt, &item_ctx);
                async move {
                    let rendered = rendered?;
                    let raw = provider.complete(&rendered).await?;
                    Ok::<_, EngineError>(Value::String(raw))
                }
            })
            .await?;

            Ok(BlockExecutionOutput {
                list_outputs: Some(Value::Array(outputs)),
                ..Default::default()
            })
        }

        BlockConfig::MultiList {
            prompt,
            input_lists_config,
            ..
        } => {
            let mut lists: Vec<Vec<Value>> = Vec::with_capacity(input_lists_config.len());
            for entry in input_lists_config {
                let items = list_from_context(context, &entry.name)?;
                lists.push(items);
            }
            // Distinct priorities are enforced at config validation time; the
            // outer product iterates lists in config order regardless of the
            // priority values themselves.
            let combinations = cartesian_product(&lists);

            let flat_outputs = fan_out(&combinations, |combo, _index| {
                let mut combo_ctx = context.clone();
                for (n, value) in combo.iter().enumerate() {
                    let position = n + 1;
                    combo_ctx.insert(format!("item{position}"), value.value.clone());
                    combo_ctx.insert(format!("item{position}_index"), Value::from(value.index));
                }
                let rendered = template::render(prompt, &combo_ctx);
                async move {
                    let rendered = rendered?;
                    let raw = provider.complete(&rendered).await?;
                    Ok::<_, EngineError>(Value::String(raw))
                }
            })
            .await?;

            // Reshape the flat, order-preserved result vector back into a
            // structure of depth k matching the declared list shapes (spec
            // §4.4: "a nested structure of depth k"; example 5).
            let shape: Vec<usize> = lists.iter().map(|l| l.len()).collect();
            let nested = nest(&flat_outputs, &shape);

            Ok(BlockExecutionOutput {
                matrix_outputs: Some(nested),
                ..Default::default()
            })
        }
    }
}

fn list_from_context(context: &HashMap<String, Value>, name: &str) -> Result<Vec<Value>> {
    match context.get(name) {
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(_) => Err(EngineError::ConfigMisshapen(format!(
            "variable '{name}' is not a list"
        ))),
        None => Err(EngineError::TemplateUndefined {
            name: name.to_string(),
        }),
    }
}

/// Runs `work` over every element of `items` with bounded concurrency,
/// returning results in the same order as `items`.
async fn fan_out<T, F, Fut>(items: &[T], work: F) -> Result<Vec<Value>>
where
    F: Fn(&T, usize) -> Fut,
    Fut: std::future::Future<Output = Result<Value>>,
{
    let futures_vec: Vec<_> = items
        .iter()
        .enumerate()
        .map(|(i, item)| work(item, i))
        .collect();
    stream::iter(futures_vec)
        .buffered(FAN_OUT_CONCURRENCY)
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect::<Result<Vec<Value>>>()
}

/// One list's contribution to a single combination: its value and its
/// index within that list (for the `item{n}_index` binding).
#[derive(Clone)]
struct IndexedValue {
    value: Value,
    index: usize,
}

/// Outer product of k lists, iterated in declared order: the last list
/// varies fastest, matching the row-major flattening `nest` expects back.
fn cartesian_product(lists: &[Vec<Value>]) -> Vec<Vec<IndexedValue>> {
    lists.iter().fold(vec![Vec::new()], |acc, values| {
        acc.into_iter()
            .flat_map(|prefix| {
                values.iter().enumerate().map(move |(index, v)| {
                    let mut combo = prefix.clone();
                    combo.push(IndexedValue {
                        value: v.clone(),
                        index,
                    });
                    combo
                })
            })
            .collect()
    })
}

/// Reshape a flat, row-major vector of LLM results into a nested JSON
/// array of depth `shape.len()`, e.g. shape `[2, 3]` produces 2 arrays of
/// 3 elements each: `[["a-x","a-y"],["b-x","b-y"]]`.
fn nest(flat: &[Value], shape: &[usize]) -> Value {
    match shape {
        [] => flat.first().cloned().unwrap_or(Value::Null),
        [_only] => Value::Array(flat.to_vec()),
        [first, rest @ ..] => {
            let chunk_size: usize = rest.iter().product();
            let chunks = flat
                .chunks(chunk_size.max(1))
                .take(*first)
                .map(|chunk| nest(chunk, rest))
                .collect();
            Value::Array(chunks)
        }
    }
}

pub type SharedProvider = Arc<dyn LlmProvider>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::StubLlmProvider;
    use serde_json::json;

    #[tokio::test]
    async fn standard_block_wraps_completion_under_output_name() {
        let provider = StubLlmProvider::fixed("42");
        let config = BlockConfig::Standard {
            prompt: "What is 6*7?".to_string(),
            output_variable_name: "answer".to_string(),
        };
        let ctx = HashMap::new();
        let out = execute_block(&config, &ctx, &provider).await.unwrap();
        assert_eq!(out.named_outputs.unwrap()["answer"], json!("42"));
    }

    #[tokio::test]
    async fn single_list_preserves_item_order() {
        let provider = StubLlmProvider::fixed("ok");
        let config = BlockConfig::SingleList {
            prompt: "Summarize {{item}}".to_string(),
            input_list_variable_name: "topics".to_string(),
            output_list_variable_name: None,
        };
        let mut ctx = HashMap::new();
        ctx.insert("topics".to_string(), json!(["a", "b", "c"]));
        let out = execute_block(&config, &ctx, &provider).await.unwrap();
        let list = out.list_outputs.unwrap();
        assert_eq!(list.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn multi_list_produces_nested_outer_product() {
        let provider = StubLlmProvider::fixed("ok");
        let config = BlockConfig::MultiList {
            prompt: "{{item1}}-{{item2}}".to_string(),
            input_lists_config: vec![
                crate::model::ListInputConfig {
                    name: "a".to_string(),
                    priority: 1,
                },
                crate::model::ListInputConfig {
                    name: "b".to_string(),
                    priority: 2,
                },
            ],
            output_matrix_variable_name: None,
        };
        let mut ctx = HashMap::new();
        ctx.insert("a".to_string(), json!(["x", "y"]));
        ctx.insert("b".to_string(), json!([1, 2, 3]));
        let out = execute_block(&config, &ctx, &provider).await.unwrap();
        let matrix = out.matrix_outputs.unwrap();
        let rows = matrix.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].as_array().unwrap().len(), 3);
        assert_eq!(rows[1].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn multi_list_renders_spec_example_five() {
        let provider = DeterministicLlmProvider;
        let config = BlockConfig::MultiList {
            prompt: "{{item1}}-{{item2}}".to_string(),
            input_lists_config: vec![
                crate::model::ListInputConfig {
                    name: "a".to_string(),
                    priority: 1,
                },
                crate::model::ListInputConfig {
                    name: "b".to_string(),
                    priority: 2,
                },
            ],
            output_matrix_variable_name: None,
        };
        let mut ctx = HashMap::new();
        ctx.insert("a".to_string(), json!(["a", "b"]));
        ctx.insert("b".to_string(), json!(["x", "y"]));
        let out = execute_block(&config, &ctx, &provider).await.unwrap();
        assert_eq!(
            out.matrix_outputs.unwrap(),
            json!([["a-x", "a-y"], ["b-x", "b-y"]])
        );
    }

    /// Echoes the rendered prompt back verbatim, so the matrix content can
    /// be asserted against a literal expected value.
    struct DeterministicLlmProvider;

    #[async_trait::async_trait]
    impl crate::llm::LlmProvider for DeterministicLlmProvider {
        async fn complete(&self, prompt: &str) -> Result<String> {
            Ok(prompt.to_string())
        }
    }
}
