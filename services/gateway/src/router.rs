//! HTTP route wiring for the planning gateway.
//!
//! Route paths match the documented endpoint table literally, including
//! the four distinct `/api/reload-*` routes (not a single parameterized
//! route — see `handlers::reload`) and a supplemental `/api/propagate`
//! for the upstream-propagation pass, which has no dedicated path in the
//! documented surface but needs a trigger now that it is decoupled from
//! the reference's request-time side effects.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/select_database/{database_id}", get(handlers::select_database))
        .route("/planning_selection", get(handlers::planning_selection))
        .route("/select_planning/{id}", get(handlers::select_planning))
        .route("/planning", get(handlers::planning_view))
        .route("/get_planning_data", get(handlers::get_planning_data))
        .route("/move_task", post(handlers::move_task))
        .route("/resize_task", post(handlers::resize_task))
        .route("/resize_and_move_task", post(handlers::resize_and_move_task))
        .route("/keyboard_move_task", post(handlers::keyboard_move_task))
        .route("/api/reload-tasks", post(handlers::reload))
        .route("/api/reload-operators", post(handlers::reload))
        .route("/api/reload-affairs", post(handlers::reload))
        .route("/api/reload-all", post(handlers::reload))
        .route("/api/propagate", post(handlers::propagate))
        .layer(axum::middleware::from_fn(crate::middleware::request_logging))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
