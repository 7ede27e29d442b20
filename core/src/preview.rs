//! Renders a block's prompt without calling an LLM.
//!
//! Earlier blocks' declared outputs are stood in for with placeholder
//! strings instead of being actually executed, and a target list block
//! gets placeholder `item`/
//! `item_index` bindings (plus one binding per MultiList input list) so
//! its prompt can be previewed before any list values exist. An undefined
//! reference is reported back as an inline message rather than failing
//! the preview request — the caller is actively authoring the prompt and
//! expects to see what's still missing.

use std::collections::HashMap;

use serde_json::{json, Value};

use crate::error::EngineError;
use crate::model::{Block, BlockConfig};
use crate::template;

pub struct PreviewOutput {
    pub rendered_prompt: Option<String>,
    pub error_message: Option<String>,
}

/// Preview `target`'s prompt given the blocks that would run before it
/// (`prior_blocks`, already in sequence order) and the run's seed context.
pub fn preview_block(
    target: &Block,
    prior_blocks: &[Block],
    seed_context: &HashMap<String, Value>,
) -> PreviewOutput {
    let mut context = seed_context.clone();

    for block in prior_blocks {
        seed_placeholder_outputs(block, &mut context);
    }
    seed_list_placeholders(&target.config, &mut context);

    match template::render(target.config.prompt(), &context) {
        Ok(rendered) => PreviewOutput {
            rendered_prompt: Some(rendered),
            error_message: None,
        },
        Err(EngineError::TemplateUndefined { name }) => PreviewOutput {
            rendered_prompt: None,
            error_message: Some(format!(
                "'{name}' is not defined yet at this point in the sequence"
            )),
        },
        Err(other) => PreviewOutput {
            rendered_prompt: None,
            error_message: Some(other.to_string()),
        },
    }
}

/// Stand in for a prior block's real output with a literal placeholder
/// per block type, so a rendered preview reads like "building on the
/// output of block X" rather than raw noise.
fn seed_placeholder_outputs(block: &Block, context: &mut HashMap<String, Value>) {
    match &block.config {
        BlockConfig::Standard {
            output_variable_name,
            ..
        } => {
            context.insert(
                output_variable_name.clone(),
                Value::String(format!("[Output from {} (ID: {})]", block.name, block.id)),
            );
        }
        BlockConfig::Discretization { output_names, .. } => {
            for name in output_names {
                context.insert(
                    name.clone(),
                    Value::String(format!(
                        "[Discretized output '{name}' from {}]",
                        block.name
                    )),
                );
            }
        }
        BlockConfig::SingleList { .. } => {
            let name = block.config.output_list_variable_name_or(block.id);
            context.insert(
                name,
                json!([format!(
                    "[Sample item from list output of {}]",
                    block.name
                )]),
            );
        }
        BlockConfig::MultiList { .. } => {
            let name = block.config.output_matrix_variable_name_or(block.id);
            context.insert(
                name,
                json!([[format!(
                    "[Sample item from matrix output of {}]",
                    block.name
                )]]),
            );
        }
    }
}

/// Seed the target block's own inner-loop bindings — `item`/`item_index`
/// for SingleList, `item{n}`/`item{n}_index` per declared list for
/// MultiList — so its own prompt previews cleanly even though no list
/// values exist yet.
fn seed_list_placeholders(config: &BlockConfig, context: &mut HashMap<String, Value>) {
    match config {
        BlockConfig::SingleList { .. } => {
            context.insert("item".to_string(), json!("[Sample item]"));
            context.insert("item_index".to_string(), json!(0));
        }
        BlockConfig::MultiList {
            input_lists_config, ..
        } => {
            for (n, _list) in input_lists_config.iter().enumerate() {
                let position = n + 1;
                context.insert(format!("item{position}"), json!("[Sample item]"));
                context.insert(format!("item{position}_index"), json!(0));
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(id: i64, name: &str, config: BlockConfig) -> Block {
        Block {
            id,
            sequence_id: 1,
            name: name.to_string(),
            order: id,
            config,
        }
    }

    #[test]
    fn reports_undefined_reference_inline() {
        let target = block(
            1,
            "b1",
            BlockConfig::Standard {
                prompt: "{{never_declared}}".to_string(),
                output_variable_name: "out".to_string(),
            },
        );
        let out = preview_block(&target, &[], &HashMap::new());
        assert!(out.rendered_prompt.is_none());
        assert!(out.error_message.unwrap().contains("never_declared"));
    }

    #[test]
    fn prior_block_output_is_available_as_a_placeholder() {
        let prior = block(
            1,
            "summarize",
            BlockConfig::Standard {
                prompt: "ignored".to_string(),
                output_variable_name: "summary".to_string(),
            },
        );
        let target = block(
            2,
            "b2",
            BlockConfig::Standard {
                prompt: "Expand on: {{summary}}".to_string(),
                output_variable_name: "out".to_string(),
            },
        );
        let out = preview_block(&target, &[prior], &HashMap::new());
        assert!(out
            .rendered_prompt
            .unwrap()
            .contains("[Output from summarize (ID: 1)]"));
    }

    #[test]
    fn list_block_gets_item_placeholder() {
        let target = block(
            1,
            "per_item",
            BlockConfig::SingleList {
                prompt: "Process {{item}} at {{item_index}}".to_string(),
                input_list_variable_name: "topics".to_string(),
                output_list_variable_name: None,
            },
        );
        let out = preview_block(&target, &[], &HashMap::new());
        assert!(out.rendered_prompt.is_some());
    }

    #[test]
    fn multi_list_block_gets_positional_item_placeholders() {
        let target = block(
            1,
            "cross",
            BlockConfig::MultiList {
                prompt: "{{item1}}-{{item2}} at {{item1_index}}/{{item2_index}}".to_string(),
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
            },
        );
        let out = preview_block(&target, &[], &HashMap::new());
        assert!(out.rendered_prompt.is_some());
    }

    #[test]
    fn discretization_prior_output_uses_spec_placeholder_text() {
        let prior = block(
            1,
            "extract",
            BlockConfig::Discretization {
                prompt: "ignored".to_string(),
                output_names: vec!["title".to_string()],
            },
        );
        let target = block(
            2,
            "b2",
            BlockConfig::Standard {
                prompt: "Title was: {{title}}".to_string(),
                output_variable_name: "out".to_string(),
            },
        );
        let out = preview_block(&target, &[prior], &HashMap::new());
        assert!(out
            .rendered_prompt
            .unwrap()
            .contains("[Discretized output 'title' from extract]"));
    }
}
