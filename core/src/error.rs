//! Error taxonomy for the execution engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("undefined variable '{name}' referenced in template")]
    TemplateUndefined { name: String },

    #[error("block config is malformed: {0}")]
    ConfigMisshapen(String),

    #[error("llm provider unavailable: {0}")]
    LlmUnavailable(String),

    #[error("llm call timed out after {0:?}")]
    LlmTimeout(std::time::Duration),

    #[error("llm returned a malformed response: {0}")]
    LlmMalformedResponse(String),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
