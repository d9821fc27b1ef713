//! HTTP handlers implementing the gateway's documented surface. Mutation
//! endpoints always answer 200 with `{success, error?, ...}`; only
//! infrastructure faults (a dead database, a planning never loaded)
//! escalate to 5xx — domain rejections stay in the 200 envelope.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use coordinator::NudgeDirection;
use serde::{Deserialize, Serialize};
use shared::ids::{PlanningId, RowId, TaskId};

use crate::state::AppState;

fn no_planning_selected() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"success": false, "error": "no planning selected"})))
}

fn infra_error(context: &str, err: anyhow::Error) -> impl IntoResponse {
    tracing::error!(error = %err, "{context}");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({"success": false, "error": context})))
}

pub async fn index() -> impl IntoResponse {
    Json(serde_json::json!({"service": "planning-gateway"}))
}

pub async fn select_database(Path(_database_id): Path<String>) -> impl IntoResponse {
    // Multiple upstream database connections are an external-collaborator
    // concern; this service keeps one pool and just acks the selector so
    // clients built against the documented interface still work.
    Json(serde_json::json!({"success": true}))
}

pub async fn planning_selection(State(state): State<AppState>) -> impl IntoResponse {
    match state.loader.list_plannings().await {
        Ok(plannings) => (StatusCode::OK, Json(serde_json::json!({"success": true, "plannings": plannings}))).into_response(),
        Err(err) => infra_error("failed to list plannings", err).into_response(),
    }
}

pub async fn select_planning(Path(id): Path<i64>, State(state): State<AppState>) -> impl IntoResponse {
    match state.select_planning(PlanningId::new(id)).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({"success": true}))).into_response(),
        Err(err) => infra_error("failed to load planning", err).into_response(),
    }
}

pub async fn planning_view(State(state): State<AppState>) -> impl IntoResponse {
    get_planning_data(State(state)).await.into_response()
}

pub async fn get_planning_data(State(state): State<AppState>) -> impl IntoResponse {
    let Some(loaded) = state.selected_planning() else {
        return no_planning_selected().into_response();
    };
    let store = loaded.store.read();
    let horizon = planning_horizon(&store, &state.coordinator_config);
    let projection = projection::project(&store, horizon, state.locale);
    (StatusCode::OK, Json(serde_json::json!({"success": true, "planning": projection}))).into_response()
}

#[derive(Debug, Deserialize)]
pub struct MoveTaskRequest {
    pub task_id: i64,
    pub operator_id: i64,
    pub start_slot: u32,
}

pub async fn move_task(State(state): State<AppState>, Json(req): Json<MoveTaskRequest>) -> impl IntoResponse {
    let Some(loaded) = state.selected_planning() else {
        return no_planning_selected().into_response();
    };
    let outcome = loaded
        .coordinator
        .move_task(TaskId::new(req.task_id), RowId::new(req.operator_id), req.start_slot)
        .await;
    (StatusCode::OK, Json(outcome)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct ResizeTaskRequest {
    pub task_id: i64,
    pub duration: u32,
}

pub async fn resize_task(State(state): State<AppState>, Json(req): Json<ResizeTaskRequest>) -> impl IntoResponse {
    let Some(loaded) = state.selected_planning() else {
        return no_planning_selected().into_response();
    };
    let outcome = loaded.coordinator.resize_task(TaskId::new(req.task_id), req.duration).await;
    (StatusCode::OK, Json(outcome)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct ResizeAndMoveTaskRequest {
    pub task_id: i64,
    pub operator_id: i64,
    pub start_slot: u32,
    pub duration: u32,
}

pub async fn resize_and_move_task(
    State(state): State<AppState>,
    Json(req): Json<ResizeAndMoveTaskRequest>,
) -> impl IntoResponse {
    let Some(loaded) = state.selected_planning() else {
        return no_planning_selected().into_response();
    };
    let outcome = loaded
        .coordinator
        .resize_and_move_task(TaskId::new(req.task_id), RowId::new(req.operator_id), req.start_slot, req.duration)
        .await;
    (StatusCode::OK, Json(outcome)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct KeyboardMoveRequest {
    pub task_id: i64,
    pub direction: NudgeDirection,
}

pub async fn keyboard_move_task(
    State(state): State<AppState>,
    Json(req): Json<KeyboardMoveRequest>,
) -> impl IntoResponse {
    let Some(loaded) = state.selected_planning() else {
        return no_planning_selected().into_response();
    };
    let outcome = loaded.coordinator.keyboard_nudge(TaskId::new(req.task_id), req.direction).await;
    (StatusCode::OK, Json(outcome)).into_response()
}

/// Backs all four `/api/reload-*` routes. The loader reloads a planning's
/// tasks, operators/workcenters, and affairs together in one query set,
/// so all four share an implementation; the routes stay distinct only to
/// preserve the documented endpoint shape for callers that distinguish
/// them.
pub async fn reload(State(state): State<AppState>) -> impl IntoResponse {
    match state.reload_selected().await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({"success": true}))).into_response(),
        Err(err) => infra_error("failed to reload planning", err).into_response(),
    }
}

#[derive(Debug, Serialize)]
pub struct PropagationSummary {
    pub production_starts: propagator::PropagationReport,
    pub operation_lines: propagator::PropagationReport,
}

pub async fn propagate(State(state): State<AppState>) -> impl IntoResponse {
    let Some(loaded) = state.selected_planning() else {
        return no_planning_selected().into_response();
    };
    let (tasks, display_type) = {
        let store = loaded.store.read();
        (store.all_tasks(), store.display_type())
    };
    let production_starts =
        propagator::propagate_production_starts(&tasks, display_type, state.work_order_gateway.as_ref()).await;
    let operation_lines = propagator::propagate_operation_lines(&tasks, state.work_order_gateway.as_ref()).await;
    (
        StatusCode::OK,
        Json(serde_json::json!({"success": true, "report": PropagationSummary { production_starts, operation_lines }})),
    )
        .into_response()
}

fn planning_horizon(store: &store::TaskStore, config: &coordinator::CoordinatorConfig) -> calendar::SlotIndex {
    let start_date = store.calendar().planning_start_date;
    let days_until_end_date = store.meta.end_date.map(|end| (end - start_date).num_days());
    let last_task_day = store.all_tasks().into_iter().map(|t| t.start.date()).max();
    calendar::compute_horizon(
        config.min_horizon_slots,
        config.horizon_margin_slots,
        days_until_end_date,
        last_task_day,
        start_date,
    )
}
