//! Lists the variable names available to a block at authoring time (spec
//! §4.7), grounded on the `available_for_sequence` route logic: Sequence
//! Variables, GlobalLists, and the predicted outputs of blocks ordered
//! before the target are merged, keeping the first definition of any name
//! and dropping later duplicates rather than letting a shadowing name
//! silently win.

use std::collections::HashSet;

use crate::model::{Block, BlockConfig, GlobalList, Variable, VariableType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableSource {
    /// A sequence-scoped Variable; carries its declared type
    /// (`global` | `input`).
    SequenceVariable(VariableType),
    GlobalList,
    BlockOutput {
        block_id: i64,
        block_name: String,
        kind: BlockOutputKind,
    },
}

/// Which of a block's predicted-output tags a name was derived from (spec
/// §4.7: "Standard → one `block_output`; ... SingleList → one `list_output`;
/// MultiList → one `matrix_output`").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOutputKind {
    Block,
    List,
    Matrix,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableVariable {
    pub name: String,
    pub source: VariableSource,
    pub description: Option<String>,
}

/// Variables visible to `target_order` (a block's `order` value), i.e.
/// everything declared on the sequence plus the outputs of every block
/// strictly before it.
pub fn available_variables(
    variables: &[Variable],
    global_lists: &[GlobalList],
    blocks_before: &[Block],
) -> Vec<AvailableVariable> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();

    for var in variables {
        if seen.insert(var.name.clone()) {
            result.push(AvailableVariable {
                name: var.name.clone(),
                source: VariableSource::SequenceVariable(var.var_type),
                description: var.description.clone(),
            });
        }
    }

    for list in global_lists {
        if seen.insert(list.name.clone()) {
            result.push(AvailableVariable {
                name: list.name.clone(),
                source: VariableSource::GlobalList,
                description: list.description.clone(),
            });
        }
    }

    for block in blocks_before {
        for (name, kind, description) in predicted_outputs(block) {
            if seen.insert(name.clone()) {
                result.push(AvailableVariable {
                    name,
                    source: VariableSource::BlockOutput {
                        block_id: block.id,
                        block_name: block.name.clone(),
                        kind,
                    },
                    description: Some(description),
                });
            }
        }
    }

    result
}

fn predicted_outputs(block: &Block) -> Vec<(String, BlockOutputKind, String)> {
    match &block.config {
        BlockConfig::Standard {
            output_variable_name,
            ..
        } => vec![(
            output_variable_name.clone(),
            BlockOutputKind::Block,
            format!("Output of '{}'", block.name),
        )],
        BlockConfig::Discretization { output_names, .. } => output_names
            .iter()
            .map(|n| {
                (
                    n.clone(),
                    BlockOutputKind::Block,
                    format!("Discretized output '{n}' from '{}'", block.name),
                )
            })
            .collect(),
        BlockConfig::SingleList { .. } => vec![(
            block.config.output_list_variable_name_or(block.id),
            BlockOutputKind::List,
            format!("List output of '{}'", block.name),
        )],
        BlockConfig::MultiList { .. } => vec![(
            block.config.output_matrix_variable_name_or(block.id),
            BlockOutputKind::Matrix,
            format!("Matrix output of '{}'", block.name),
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VariableType;
    use serde_json::json;

    fn seq_var(name: &str) -> Variable {
        Variable {
            id: 1,
            sequence_id: 1,
            name: name.to_string(),
            var_type: VariableType::Global,
            payload: json!({ "value": "x" }),
            description: None,
        }
    }

    fn block(id: i64, name: &str, output: &str) -> Block {
        Block {
            id,
            sequence_id: 1,
            name: name.to_string(),
            order: id,
            config: BlockConfig::Standard {
                prompt: "p".to_string(),
                output_variable_name: output.to_string(),
            },
        }
    }

    #[test]
    fn keeps_first_definition_on_name_collision() {
        let vars = vec![seq_var("shared")];
        let blocks = vec![block(1, "b1", "shared")];
        let result = available_variables(&vars, &[], &blocks);
        let shared: Vec<_> = result.iter().filter(|v| v.name == "shared").collect();
        assert_eq!(shared.len(), 1);
        assert_eq!(
            shared[0].source,
            VariableSource::SequenceVariable(VariableType::Global)
        );
    }

    #[test]
    fn includes_predicted_block_outputs() {
        let blocks = vec![block(1, "b1", "out1"), block(2, "b2", "out2")];
        let result = available_variables(&[], &[], &blocks);
        let names: Vec<_> = result.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["out1", "out2"]);
    }
}
