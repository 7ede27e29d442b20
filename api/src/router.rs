//! Route table: all routes prefixed `/api/v1`, plus an unprefixed
//! `/healthcheck`.

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let cors = build_cors(&state.config.backend_cors_origins);

    let api_v1 = Router::new()
        .nest("/auth", auth_routes())
        .nest("/sequences", sequence_routes())
        .nest("/blocks", block_routes())
        .nest("/variables", variable_routes())
        .nest("/global-lists", global_list_routes())
        .nest("/runs", run_routes())
        .nest("/engine", engine_routes());

    Router::new()
        .route("/healthcheck", get(handlers::health::healthcheck))
        .nest("/api/v1", api_v1)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        tracing::warn!("CORS origins not configured; API might not be accessible from a browser frontend");
        AllowOrigin::list(Vec::new())
    } else {
        let parsed: Vec<_> = origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/me", get(handlers::auth::me))
}

fn sequence_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::sequences::create).get(handlers::sequences::list))
        .route(
            "/:id",
            get(handlers::sequences::get)
                .put(handlers::sequences::update)
                .delete(handlers::sequences::delete),
        )
}

fn block_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::blocks::create))
        .route("/in_sequence/:sequence_id", get(handlers::blocks::list_for_sequence))
        .route(
            "/:id",
            get(handlers::blocks::get)
                .put(handlers::blocks::update)
                .delete(handlers::blocks::delete),
        )
}

fn variable_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::variables::create))
        .route("/by_sequence/:sequence_id", get(handlers::variables::list_for_sequence))
        .route(
            "/available_for_sequence/:sequence_id",
            get(handlers::variables::available_for_sequence),
        )
        .route(
            "/:id",
            get(handlers::variables::get)
                .put(handlers::variables::update)
                .delete(handlers::variables::delete),
        )
}

fn global_list_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(handlers::global_lists::create).get(handlers::global_lists::list),
        )
        .route(
            "/:id",
            get(handlers::global_lists::get)
                .put(handlers::global_lists::update)
                .delete(handlers::global_lists::delete),
        )
        .route(
            "/:id/items",
            post(handlers::global_lists::create_item).get(handlers::global_lists::list_items),
        )
        .route(
            "/:id/items/:item_id",
            put(handlers::global_lists::update_item).delete(handlers::global_lists::delete_item),
        )
}

fn run_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::runs::create))
        .route("/by_sequence/:sequence_id", get(handlers::runs::list_for_sequence))
        .route("/block_run/:id", get(handlers::runs::get_block_run))
        .route("/:id", get(handlers::runs::get))
}

fn engine_routes() -> Router<AppState> {
    Router::new().route("/preview_prompt", post(handlers::engine::preview_prompt))
}
