//! Domain types shared by the execution engine, persistence layer and HTTP
//! layer.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identity owning all sequences and global lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub is_active: bool,
}

/// An authored pipeline; owns Blocks, Variables and Runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sequence {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    Global,
    Input,
}

impl VariableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableType::Global => "global",
            VariableType::Input => "input",
        }
    }
}

impl std::str::FromStr for VariableType {
    type Err = crate::error::EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(VariableType::Global),
            "input" => Ok(VariableType::Input),
            other => Err(crate::error::EngineError::ConfigMisshapen(format!(
                "unknown variable type '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Standard,
    Discretization,
    SingleList,
    MultiList,
}

impl BlockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Standard => "standard",
            BlockType::Discretization => "discretization",
            BlockType::SingleList => "single_list",
            BlockType::MultiList => "multi_list",
        }
    }
}

impl std::str::FromStr for BlockType {
    type Err = crate::error::EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(BlockType::Standard),
            "discretization" => Ok(BlockType::Discretization),
            "single_list" => Ok(BlockType::SingleList),
            "multi_list" => Ok(BlockType::MultiList),
            other => Err(crate::error::EngineError::ConfigMisshapen(format!(
                "unknown block type '{other}'"
            ))),
        }
    }
}

/// One entry of a MultiList's `input_lists_config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListInputConfig {
    pub name: String,
    pub priority: i64,
}

/// Typed block configuration: a tagged variant per block type rather than
/// a single struct with optional fields, so invalid combinations are
/// unrepresentable instead of caught by runtime checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "block_type")]
pub enum BlockConfig {
    #[serde(rename = "standard")]
    Standard {
        prompt: String,
        #[serde(default = "default_output_variable_name")]
        output_variable_name: String,
    },
    #[serde(rename = "discretization")]
    Discretization {
        prompt: String,
        output_names: Vec<String>,
    },
    #[serde(rename = "single_list")]
    SingleList {
        prompt: String,
        input_list_variable_name: String,
        output_list_variable_name: Option<String>,
    },
    #[serde(rename = "multi_list")]
    MultiList {
        prompt: String,
        input_lists_config: Vec<ListInputConfig>,
        output_matrix_variable_name: Option<String>,
    },
}

fn default_output_variable_name() -> String {
    "output".to_string()
}

impl BlockConfig {
    pub fn block_type(&self) -> BlockType {
        match self {
            BlockConfig::Standard { .. } => BlockType::Standard,
            BlockConfig::Discretization { .. } => BlockType::Discretization,
            BlockConfig::SingleList { .. } => BlockType::SingleList,
            BlockConfig::MultiList { .. } => BlockType::MultiList,
        }
    }

    pub fn prompt(&self) -> &str {
        match self {
            BlockConfig::Standard { prompt, .. } => prompt,
            BlockConfig::Discretization { prompt, .. } => prompt,
            BlockConfig::SingleList { prompt, .. } => prompt,
            BlockConfig::MultiList { prompt, .. } => prompt,
        }
    }

    /// Validate structural invariants that the executor relies on, so that
    /// a malformed config is rejected at parse time rather than at
    /// execution time (DESIGN NOTE "Polymorphic block config").
    pub fn validate(&self) -> crate::error::Result<()> {
        match self {
            BlockConfig::Discretization { output_names, .. } if output_names.is_empty() => {
                Err(crate::error::EngineError::ConfigMisshapen(
                    "discretization block requires a non-empty output_names".to_string(),
                ))
            }
            BlockConfig::MultiList {
                input_lists_config, ..
            } => {
                if input_lists_config.len() < 2 {
                    return Err(crate::error::EngineError::ConfigMisshapen(
                        "multi_list block requires at least two input lists".to_string(),
                    ));
                }
                let mut by_priority: HashMap<i64, usize> = HashMap::new();
                for list in input_lists_config {
                    *by_priority.entry(list.priority).or_insert(0) += 1;
                }
                // Lock-step (same-priority) iteration isn't implemented; a
                // config that asks for it must be rejected rather than
                // silently cross-producted.
                if by_priority.values().any(|&count| count > 1) {
                    return Err(crate::error::EngineError::ConfigMisshapen(
                        "lock-step iteration of same-priority lists is not supported; \
                         give every input list a distinct priority"
                            .to_string(),
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn output_variable_name_or(&self, block_id: i64) -> String {
        match self {
            BlockConfig::Standard {
                output_variable_name,
                ..
            } => output_variable_name.clone(),
            _ => format!("block_{block_id}_output"),
        }
    }

    pub fn output_list_variable_name_or(&self, block_id: i64) -> String {
        match self {
            BlockConfig::SingleList {
                output_list_variable_name: Some(name),
                ..
            } => name.clone(),
            _ => format!("output_list_{block_id}"),
        }
    }

    pub fn output_matrix_variable_name_or(&self, block_id: i64) -> String {
        match self {
            BlockConfig::MultiList {
                output_matrix_variable_name: Some(name),
                ..
            } => name.clone(),
            _ => format!("output_matrix_{block_id}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Block {
    pub id: i64,
    pub sequence_id: i64,
    pub name: String,
    pub order: i64,
    pub config: BlockConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    pub id: i64,
    pub sequence_id: i64,
    pub name: String,
    pub var_type: VariableType,
    /// `{"value": ...}` for GLOBAL, `{"default": ..., "type_hint": ...}` for INPUT.
    pub payload: Value,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GlobalListItem {
    pub id: i64,
    pub global_list_id: i64,
    pub value: String,
    pub order: i64,
}

#[derive(Debug, Clone)]
pub struct GlobalList {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub items: Vec<GlobalListItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled
        )
    }

    /// Rank in the monotone order PENDING < RUNNING < terminal.
    pub fn rank(&self) -> u8 {
        match self {
            RunStatus::Pending => 0,
            RunStatus::Running => 1,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled => 2,
        }
    }
}

impl std::str::FromStr for RunStatus {
    type Err = crate::error::EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RunStatus::Pending),
            "running" => Ok(RunStatus::Running),
            "completed" => Ok(RunStatus::Completed),
            "failed" => Ok(RunStatus::Failed),
            "cancelled" => Ok(RunStatus::Cancelled),
            other => Err(crate::error::EngineError::ConfigMisshapen(format!(
                "unknown run status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Run {
    pub id: i64,
    pub sequence_id: i64,
    pub owner_id: i64,
    pub status: RunStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub input_overrides: Value,
    pub results_summary: Value,
}

#[derive(Debug, Clone)]
pub struct BlockRun {
    pub id: i64,
    pub run_id: i64,
    pub block_id: Option<i64>,
    pub block_name_snapshot: String,
    pub block_type_snapshot: BlockType,
    pub status: RunStatus,
    pub prompt_text: Option<String>,
    pub raw_llm_text: Option<String>,
    pub named_outputs: Option<Value>,
    pub list_outputs: Option<Value>,
    pub matrix_outputs: Option<Value>,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub prompt_tokens: Option<i64>,
    pub completion_tokens: Option<i64>,
    pub cost_usd: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discretization_requires_output_names() {
        let cfg = BlockConfig::Discretization {
            prompt: "x".into(),
            output_names: vec![],
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn multi_list_requires_two_lists() {
        let cfg = BlockConfig::MultiList {
            prompt: "x".into(),
            input_lists_config: vec![ListInputConfig {
                name: "a".into(),
                priority: 1,
            }],
            output_matrix_variable_name: None,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn multi_list_rejects_shared_priority() {
        let cfg = BlockConfig::MultiList {
            prompt: "x".into(),
            input_lists_config: vec![
                ListInputConfig {
                    name: "a".into(),
                    priority: 1,
                },
                ListInputConfig {
                    name: "b".into(),
                    priority: 1,
                },
            ],
            output_matrix_variable_name: None,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn multi_list_accepts_distinct_priorities() {
        let cfg = BlockConfig::MultiList {
            prompt: "x".into(),
            input_lists_config: vec![
                ListInputConfig {
                    name: "a".into(),
                    priority: 1,
                },
                ListInputConfig {
                    name: "b".into(),
                    priority: 2,
                },
            ],
            output_matrix_variable_name: None,
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn run_status_rank_is_monotone() {
        assert!(RunStatus::Pending.rank() < RunStatus::Running.rank());
        assert!(RunStatus::Running.rank() < RunStatus::Completed.rank());
        assert_eq!(RunStatus::Completed.rank(), RunStatus::Failed.rank());
    }
}
