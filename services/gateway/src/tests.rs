//! HTTP-level tests for the router wiring: route paths, the shared
//! `/api/reload-*` handler, and the 200-envelope-vs-5xx split between
//! domain rejections and infrastructure failures.
//!
//! The pool is built lazily (`connect_lazy`) so these run without a real
//! Postgres instance; any handler that actually issues a query surfaces
//! that as a connection error, which is still useful: it proves the
//! route reaches the handler and the handler's error path returns the
//! right status.

use axum::http::StatusCode;
use axum_test::TestServer;
use sqlx::postgres::PgPoolOptions;

use crate::{create_router, AppState};

fn test_server() -> TestServer {
    let config = shared::PlanningConfig::default();
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .expect("lazy pool construction does not touch the network");
    let state = AppState::new(pool, &config).expect("valid default config");
    TestServer::new(create_router(state)).expect("router builds into a test server")
}

#[tokio::test]
async fn index_reports_the_service_name() {
    let server = test_server();
    let response = server.get("/").await;
    response.assert_status_ok();
    assert_eq!(response.json::<serde_json::Value>()["service"], "planning-gateway");
}

#[tokio::test]
async fn select_database_acks_without_touching_state() {
    let server = test_server();
    let response = server.get("/select_database/db-1").await;
    response.assert_status_ok();
    assert_eq!(response.json::<serde_json::Value>()["success"], true);
}

#[tokio::test]
async fn get_planning_data_with_nothing_selected_is_a_200_envelope() {
    let server = test_server();
    let response = server.get("/get_planning_data").await;
    response.assert_status_ok();
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "no planning selected");
}

#[tokio::test]
async fn move_task_with_nothing_selected_is_a_200_envelope_not_a_500() {
    let server = test_server();
    let response = server
        .post("/move_task")
        .json(&serde_json::json!({"task_id": 1, "operator_id": 2, "start_slot": 3}))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<serde_json::Value>()["success"], false);
}

#[tokio::test]
async fn reload_with_nothing_selected_is_an_infra_error() {
    let server = test_server();
    let response = server.post("/api/reload-all").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<serde_json::Value>()["success"], false);
}

#[tokio::test]
async fn select_planning_against_an_unreachable_database_surfaces_as_infra_error() {
    let server = test_server();
    let response = server.get("/select_planning/1").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<serde_json::Value>()["success"], false);
}

#[tokio::test]
async fn the_four_reload_routes_all_resolve_to_the_same_handler() {
    let server = test_server();
    for path in ["/api/reload-tasks", "/api/reload-operators", "/api/reload-affairs", "/api/reload-all"] {
        let response = server.post(path).await;
        assert_ne!(response.status_code(), StatusCode::NOT_FOUND, "{path} should be routed");
    }
}
