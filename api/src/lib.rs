//! HTTP API surface for prompt sequence authoring and execution.
//!
//! Thin axum layer over `promptgraph_core` (engine semantics) and
//! `promptgraph_db` (persistence): handlers translate between wire DTOs and
//! domain types, re-derive ownership on every mutation, and otherwise defer
//! to the engine and db crates for behavior.

pub mod auth;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
