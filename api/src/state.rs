//! Shared process state handed to every handler via axum's `State`
//! extractor.

use std::sync::Arc;

use promptgraph_core::config::Config;
use promptgraph_core::llm::LlmProvider;
use promptgraph_db::Pool;

#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
    pub config: Config,
    pub llm_provider: Arc<dyn LlmProvider>,
}
