//! PromptGraph backend entrypoint.
//!
//! Loads configuration, wires the database pool and LLM provider into the
//! shared [`AppState`], and serves the HTTP API (spec §5, §6;
//! original_source `app/main.py`'s `uvicorn.run(app, host="0.0.0.0", port=8000)`).

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use promptgraph_api::{build_router, AppState};
use promptgraph_core::config::Config;
use promptgraph_core::llm::{HttpLlmProvider, LlmProvider, StubLlmProvider};

/// Command line interface for the PromptGraph backend.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Host to bind the HTTP server to.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to bind the HTTP server to.
    #[arg(long, default_value_t = 8000)]
    port: u16,

    /// Path to a `.env` file to load before reading configuration.
    #[arg(long, default_value = ".env")]
    env_file: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if dotenvy::from_filename(&args.env_file).is_err() {
        dotenvy::dotenv().ok();
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();

    let pool = promptgraph_db::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    let llm_provider: Arc<dyn LlmProvider> = match &config.llm_api_key {
        Some(api_key) => Arc::new(HttpLlmProvider::new(api_key.clone())),
        None => {
            tracing::warn!("CLAUDE_API_KEY not set; falling back to a stub LLM provider that returns no completions");
            Arc::new(StubLlmProvider::fixed(""))
        }
    };

    let state = AppState {
        pool,
        config,
        llm_provider,
    };

    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .context("invalid host/port combination")?;

    tracing::info!(%addr, "PromptGraph backend listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    axum::serve(listener, app)
        .await
        .context("HTTP server terminated unexpectedly")?;

    Ok(())
}
