//! HTTP request/response bodies.
//!
//! Kept as a thin translation layer over `promptgraph_core::model`: most
//! response types borrow the domain type's JSON shape directly (via
//! `#[serde(flatten)]` for `BlockConfig`) rather than re-declaring every
//! field, the way the original FastAPI schemas mirrored their ORM models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use promptgraph_core::model::{
    Block, BlockConfig, BlockRun, GlobalList, GlobalListItem, Run, RunStatus, Sequence, User,
    Variable, VariableType,
};
use promptgraph_core::resolver::{AvailableVariable, VariableSource};

// ---- Auth ----

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub is_active: bool,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            is_active: u.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

// ---- Sequences ----

#[derive(Debug, Deserialize)]
pub struct SequenceCreateRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SequenceUpdateRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Serialize)]
pub struct SequenceResponse {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub blocks: Vec<BlockResponse>,
    pub variables: Vec<VariableResponse>,
}

impl SequenceResponse {
    pub fn new(sequence: Sequence, blocks: Vec<Block>, variables: Vec<Variable>) -> Self {
        Self {
            id: sequence.id,
            owner_id: sequence.owner_id,
            name: sequence.name,
            description: sequence.description,
            created_at: sequence.created_at,
            updated_at: sequence.updated_at,
            blocks: blocks.into_iter().map(Into::into).collect(),
            variables: variables.into_iter().map(Into::into).collect(),
        }
    }
}

// ---- Blocks ----

#[derive(Debug, Deserialize)]
pub struct BlockCreateRequest {
    pub sequence_id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(flatten)]
    pub config: BlockConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct BlockUpdateRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub config: Option<BlockConfig>,
}

#[derive(Debug, Serialize)]
pub struct BlockResponse {
    pub id: i64,
    pub sequence_id: i64,
    pub name: String,
    pub order: i64,
    #[serde(flatten)]
    pub config: BlockConfig,
}

impl From<Block> for BlockResponse {
    fn from(b: Block) -> Self {
        Self {
            id: b.id,
            sequence_id: b.sequence_id,
            name: b.name,
            order: b.order,
            config: b.config,
        }
    }
}

pub const DEFAULT_BLOCK_NAME: &str = "Untitled Block";

// ---- Variables ----

#[derive(Debug, Deserialize)]
pub struct VariableCreateRequest {
    pub sequence_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub var_type: VariableType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub value_json: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VariableUpdateRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub value_json: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct VariableResponse {
    pub id: i64,
    pub sequence_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub var_type: VariableType,
    pub description: Option<String>,
    pub value_json: Value,
}

impl From<Variable> for VariableResponse {
    fn from(v: Variable) -> Self {
        Self {
            id: v.id,
            sequence_id: v.sequence_id,
            name: v.name,
            var_type: v.var_type,
            description: v.description,
            value_json: v.payload,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AvailableVariableResponse {
    pub name: String,
    #[serde(rename = "type")]
    pub var_type: &'static str,
    pub source: String,
    pub description: Option<String>,
}

impl From<AvailableVariable> for AvailableVariableResponse {
    fn from(v: AvailableVariable) -> Self {
        let (var_type, source) = match &v.source {
            VariableSource::SequenceVariable(VariableType::Global) => {
                ("global", "Sequence Defined (Global)".to_string())
            }
            VariableSource::SequenceVariable(VariableType::Input) => {
                ("input", "Sequence Defined (Input)".to_string())
            }
            VariableSource::GlobalList => ("global_list", "User Global List".to_string()),
            VariableSource::BlockOutput {
                block_name, kind, ..
            } => {
                let type_tag = match kind {
                    promptgraph_core::resolver::BlockOutputKind::Block => "block_output",
                    promptgraph_core::resolver::BlockOutputKind::List => "list_output",
                    promptgraph_core::resolver::BlockOutputKind::Matrix => "matrix_output",
                };
                (type_tag, format!("Block: {block_name}"))
            }
        };
        Self {
            name: v.name,
            var_type,
            source,
            description: v.description,
        }
    }
}

// ---- Global lists ----

#[derive(Debug, Deserialize)]
pub struct GlobalListCreateRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GlobalListUpdateRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Serialize)]
pub struct GlobalListResponse {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub items: Vec<GlobalListItemResponse>,
}

impl From<GlobalList> for GlobalListResponse {
    fn from(l: GlobalList) -> Self {
        Self {
            id: l.id,
            owner_id: l.owner_id,
            name: l.name,
            description: l.description,
            items: l.items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GlobalListItemCreateRequest {
    pub value: String,
    #[serde(default)]
    pub order: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GlobalListItemUpdateRequest {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct GlobalListItemResponse {
    pub id: i64,
    pub global_list_id: i64,
    pub value: String,
    pub order: i64,
}

impl From<GlobalListItem> for GlobalListItemResponse {
    fn from(i: GlobalListItem) -> Self {
        Self {
            id: i.id,
            global_list_id: i.global_list_id,
            value: i.value,
            order: i.order,
        }
    }
}

// ---- Runs ----

#[derive(Debug, Deserialize)]
pub struct RunCreateRequest {
    pub sequence_id: i64,
    #[serde(default = "default_overrides")]
    pub input_overrides_json: Value,
}

fn default_overrides() -> Value {
    Value::Object(serde_json::Map::new())
}

#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub id: i64,
    pub sequence_id: i64,
    pub owner_id: i64,
    pub status: RunStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub input_overrides_json: Value,
    pub results_summary_json: Value,
    pub block_runs: Vec<BlockRunResponse>,
}

impl RunResponse {
    pub fn new(run: Run, block_runs: Vec<BlockRun>) -> Self {
        Self {
            id: run.id,
            sequence_id: run.sequence_id,
            owner_id: run.owner_id,
            status: run.status,
            started_at: run.started_at,
            completed_at: run.completed_at,
            input_overrides_json: run.input_overrides,
            results_summary_json: run.results_summary,
            block_runs: block_runs.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BlockRunResponse {
    pub id: i64,
    pub run_id: i64,
    pub block_id: Option<i64>,
    pub block_name_snapshot: String,
    pub block_type_snapshot: promptgraph_core::model::BlockType,
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

impl From<BlockRun> for BlockRunResponse {
    fn from(b: BlockRun) -> Self {
        Self {
            id: b.id,
            run_id: b.run_id,
            block_id: b.block_id,
            block_name_snapshot: b.block_name_snapshot,
            block_type_snapshot: b.block_type_snapshot,
            status: b.status,
            prompt_text: b.prompt_text,
            raw_llm_text: b.raw_llm_text,
            named_outputs: b.named_outputs,
            list_outputs: b.list_outputs,
            matrix_outputs: b.matrix_outputs,
            error_message: b.error_message,
            started_at: b.started_at,
            completed_at: b.completed_at,
            prompt_tokens: b.prompt_tokens,
            completion_tokens: b.completion_tokens,
            cost_usd: b.cost_usd,
        }
    }
}

// ---- Engine ----

#[derive(Debug, Deserialize)]
pub struct PreviewPromptRequest {
    pub sequence_id: i64,
    pub block_id: i64,
    #[serde(default)]
    pub input_overrides: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct PreviewPromptResponse {
    pub block_id: i64,
    pub block_name: String,
    pub block_type: promptgraph_core::model::BlockType,
    pub prompt_template: String,
    pub rendered_prompt: Option<String>,
    pub error_message: Option<String>,
    pub context_snapshot: Value,
}

// ---- Health ----

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub project_name: String,
}
