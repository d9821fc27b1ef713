//! Edit coordinator: validates edit requests, drives the collision engine,
//! and commits batches through an external persister — all-or-nothing.
//!
//! The orchestration shape (lock the aggregate, mutate, call out, roll
//! back on failure) follows `OrderService::cancel_order`/`fill_order`
//! (`orders-service/src/service.rs`), adapted for a stricter
//! linearizability rule: a `tokio::sync::Mutex` serializes whole edit
//! operations (including the persistence await point) while the
//! `parking_lot::RwLock<TaskStore>` stays available for cheap synchronous
//! reads from the projection crate.

use std::sync::Arc;

use async_trait::async_trait;
use calendar::SlotIndex;
use collision::{CollisionError, Direction};
use parking_lot::RwLock;
use serde::Serialize;
use shared::ids::{PlanningId, RowId, TaskId};
use store::{Task, TaskStore};
use tokio::sync::Mutex as AsyncMutex;

#[derive(Debug, Clone, thiserror::Error, Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum EditError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("task {0} not found")]
    NotFound(TaskId),
    #[error("not enough space")]
    OutOfSpace,
    #[error("persistence failed: {0}")]
    PersistenceFailed(String),
}

impl From<CollisionError> for EditError {
    fn from(e: CollisionError) -> Self {
        match e {
            CollisionError::OutOfSpace
            | CollisionError::ChainTooLong
            | CollisionError::SweepCapExceeded => EditError::OutOfSpace,
            CollisionError::TaskNotFound(id) => EditError::NotFound(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NudgeDirection {
    Left,
    Right,
    Up,
    Down,
}

/// Per-operation payload logging the previous and new slot/duration,
/// flattened so the gateway can serialize it directly into the
/// documented `{success, error?, ...}` envelope.
#[derive(Debug, Clone, Serialize)]
pub struct EditOutcome {
    pub success: bool,
    pub blocked: bool,
    pub error: Option<EditError>,
    pub task_id: TaskId,
    pub previous_row: RowId,
    pub previous_start_slot: SlotIndex,
    pub previous_duration_slots: u32,
    pub new_row: Option<RowId>,
    pub new_start_slot: Option<SlotIndex>,
    pub new_duration_slots: Option<u32>,
    pub moved: Vec<TaskId>,
}

impl EditOutcome {
    fn not_found(task_id: TaskId) -> Self {
        Self {
            success: false,
            blocked: false,
            error: Some(EditError::NotFound(task_id)),
            task_id,
            previous_row: RowId::new(0),
            previous_start_slot: 0,
            previous_duration_slots: 0,
            new_row: None,
            new_start_slot: None,
            new_duration_slots: None,
            moved: Vec::new(),
        }
    }

    fn rejected(before: &Task, horizon_calendar: &calendar::Calendar, error: EditError) -> Self {
        Self {
            success: false,
            blocked: false,
            error: Some(error),
            task_id: before.id,
            previous_row: before.row_id,
            previous_start_slot: before.start_slot(horizon_calendar),
            previous_duration_slots: before.duration_slots(horizon_calendar),
            new_row: None,
            new_start_slot: None,
            new_duration_slots: None,
            moved: Vec::new(),
        }
    }

    fn blocked(before: &Task, calendar: &calendar::Calendar, unchanged_slot: SlotIndex) -> Self {
        Self {
            success: true,
            blocked: true,
            error: None,
            task_id: before.id,
            previous_row: before.row_id,
            previous_start_slot: before.start_slot(calendar),
            previous_duration_slots: before.duration_slots(calendar),
            new_row: Some(before.row_id),
            new_start_slot: Some(unchanged_slot),
            new_duration_slots: Some(before.duration_slots(calendar)),
            moved: Vec::new(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn applied(
        before: &Task,
        calendar: &calendar::Calendar,
        new_row: RowId,
        new_start_slot: SlotIndex,
        new_duration_slots: u32,
        moved: Vec<TaskId>,
    ) -> Self {
        Self {
            success: true,
            blocked: false,
            error: None,
            task_id: before.id,
            previous_row: before.row_id,
            previous_start_slot: before.start_slot(calendar),
            previous_duration_slots: before.duration_slots(calendar),
            new_row: Some(new_row),
            new_start_slot: Some(new_start_slot),
            new_duration_slots: Some(new_duration_slots),
            moved,
        }
    }
}

/// External capability port for the batched commit. The coordinator
/// never talks to a database directly; `planning-persistence` implements
/// this for Postgres, and tests supply an in-memory fake.
#[async_trait]
pub trait RowPersister: Send + Sync {
    async fn persist_row(
        &self,
        planning: PlanningId,
        row: RowId,
        tasks: &[Task],
    ) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy)]
pub struct CoordinatorConfig {
    pub min_horizon_slots: u32,
    pub horizon_margin_slots: u32,
    pub keyboard_chain_cap: u32,
    pub row_sweep_cap: u32,
}

pub struct EditCoordinator<P: RowPersister> {
    planning_id: PlanningId,
    store: Arc<RwLock<TaskStore>>,
    persister: Arc<P>,
    edit_lock: AsyncMutex<()>,
    config: CoordinatorConfig,
}

impl<P: RowPersister> EditCoordinator<P> {
    pub fn new(
        planning_id: PlanningId,
        store: Arc<RwLock<TaskStore>>,
        persister: Arc<P>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            planning_id,
            store,
            persister,
            edit_lock: AsyncMutex::new(()),
            config,
        }
    }

    pub fn store(&self) -> &Arc<RwLock<TaskStore>> {
        &self.store
    }

    fn horizon(&self, store: &TaskStore) -> SlotIndex {
        let start_date = store.calendar().planning_start_date;
        let days_until_end_date = store
            .meta
            .end_date
            .map(|end| (end - start_date).num_days());
        let last_task_day = store.all_tasks().into_iter().map(|t| t.start.date()).max();
        calendar::compute_horizon(
            self.config.min_horizon_slots,
            self.config.horizon_margin_slots,
            days_until_end_date,
            last_task_day,
            start_date,
        )
    }

    async fn persist_row_or_restore(
        &self,
        row: RowId,
        snapshot: Vec<Task>,
        other_snapshot: Option<(RowId, Vec<Task>)>,
    ) -> Result<(), EditError> {
        let tasks_to_persist = self.store.read().by_row(row);
        match self
            .persister
            .persist_row(self.planning_id, row, &tasks_to_persist)
            .await
        {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::warn!(%err, row = row.get(), "persistence failed, rolling back in-memory edit");
                let store = self.store.write();
                store.restore_row(row, snapshot);
                if let Some((other_row, other_tasks)) = other_snapshot {
                    store.restore_row(other_row, other_tasks);
                }
                Err(EditError::PersistenceFailed(err.to_string()))
            }
        }
    }

    /// Moves a task to a new row/start slot, cascading collisions right.
    pub async fn move_task(
        &self,
        task_id: TaskId,
        new_row: RowId,
        new_start_slot: SlotIndex,
    ) -> EditOutcome {
        let _serialize = self.edit_lock.lock().await;

        let (before, horizon) = {
            let store = self.store.read();
            let Some(before) = store.get(task_id) else {
                return EditOutcome::not_found(task_id);
            };
            let horizon = self.horizon(&store);
            (before, horizon)
        };
        let calendar = *self.store.read().calendar();
        let dur_slots = before.duration_slots(&calendar);
        let old_row = before.row_id;

        let new_row_snapshot = self.store.read().by_row(new_row);
        let old_row_snapshot = (old_row != new_row).then(|| (old_row, self.store.read().by_row(old_row)));

        let moves = {
            let store = self.store.read();
            collision::push_right_cascade(&store, new_row, new_start_slot, dur_slots, task_id, horizon)
        };
        let moves = match moves {
            Ok(m) => m,
            Err(e) => return EditOutcome::rejected(&before, &calendar, e.into()),
        };

        {
            let store = self.store.write();
            collision::apply_moves(&store, new_row, &moves);
            let _ = store.set_position(task_id, new_row, calendar.instant_of(new_start_slot));

            if old_row != new_row {
                if let Ok(sweep_moves) =
                    collision::resolve_all_collisions(&store, new_row, horizon, self.config.row_sweep_cap)
                {
                    collision::apply_moves(&store, new_row, &sweep_moves);
                }
            }
        }

        let mut moved_ids: Vec<TaskId> = moves.iter().map(|m| m.task_id).collect();
        moved_ids.push(task_id);

        match self
            .persist_row_or_restore(new_row, new_row_snapshot, old_row_snapshot)
            .await
        {
            Ok(()) => EditOutcome::applied(&before, &calendar, new_row, new_start_slot, dur_slots, moved_ids),
            Err(e) => EditOutcome::rejected(&before, &calendar, e),
        }
    }

    /// Changes a task's duration in place, sweeping the row for overlaps.
    pub async fn resize_task(&self, task_id: TaskId, new_duration_slots: u32) -> EditOutcome {
        let _serialize = self.edit_lock.lock().await;

        if new_duration_slots < 1 {
            let calendar = *self.store.read().calendar();
            return match self.store.read().get(task_id) {
                Some(before) => EditOutcome::rejected(
                    &before,
                    &calendar,
                    EditError::InvalidRequest("duration must be at least 1 slot".into()),
                ),
                None => EditOutcome::not_found(task_id),
            };
        }

        let (before, horizon) = {
            let store = self.store.read();
            let Some(before) = store.get(task_id) else {
                return EditOutcome::not_found(task_id);
            };
            (before, self.horizon(&store))
        };
        let calendar = *self.store.read().calendar();
        let row = before.row_id;
        let new_duration_hours = calendar.slots_to_hours(new_duration_slots);

        let row_snapshot = self.store.read().by_row(row);

        {
            let store = self.store.write();
            let _ = store.set_duration(task_id, new_duration_hours);
        }

        let sweep = collision::resolve_all_collisions(&self.store.read(), row, horizon, self.config.row_sweep_cap);
        if let Ok(sweep_moves) = sweep {
            if !sweep_moves.is_empty() {
                let store = self.store.write();
                collision::apply_moves(&store, row, &sweep_moves);
            }
        }

        match self.persist_row_or_restore(row, row_snapshot, None).await {
            Ok(()) => EditOutcome::applied(&before, &calendar, row, before.start_slot(&calendar), new_duration_slots, vec![task_id]),
            Err(e) => {
                let store = self.store.write();
                let _ = store.set_duration(task_id, before.duration_hours);
                drop(store);
                EditOutcome::rejected(&before, &calendar, e)
            }
        }
    }

    /// Combined left-edge resize across rows: moves and resizes in one step.
    pub async fn resize_and_move_task(
        &self,
        task_id: TaskId,
        new_row: RowId,
        new_start_slot: SlotIndex,
        new_duration_slots: u32,
    ) -> EditOutcome {
        let _serialize = self.edit_lock.lock().await;

        if new_duration_slots < 1 {
            let calendar = *self.store.read().calendar();
            return match self.store.read().get(task_id) {
                Some(before) => EditOutcome::rejected(
                    &before,
                    &calendar,
                    EditError::InvalidRequest("duration must be at least 1 slot".into()),
                ),
                None => EditOutcome::not_found(task_id),
            };
        }

        let (before, horizon) = {
            let store = self.store.read();
            match store.get(task_id) {
                Some(before) => (before, self.horizon(&store)),
                None => return EditOutcome::not_found(task_id),
            }
        };
        let calendar = *self.store.read().calendar();
        let old_row = before.row_id;
        let new_duration_hours = calendar.slots_to_hours(new_duration_slots);

        let new_row_snapshot = self.store.read().by_row(new_row);
        let old_row_snapshot = (old_row != new_row).then(|| (old_row, self.store.read().by_row(old_row)));

        {
            let store = self.store.write();
            let _ = store.set_position(task_id, new_row, calendar.instant_of(new_start_slot));
            let _ = store.set_duration(task_id, new_duration_hours);
        }

        let mut rows_to_sweep = vec![new_row];
        if old_row != new_row {
            rows_to_sweep.push(old_row);
        }
        for row in rows_to_sweep {
            let sweep = collision::resolve_all_collisions(&self.store.read(), row, horizon, self.config.row_sweep_cap);
            if let Ok(sweep_moves) = sweep {
                if !sweep_moves.is_empty() {
                    let store = self.store.write();
                    collision::apply_moves(&store, row, &sweep_moves);
                }
            }
        }

        match self
            .persist_row_or_restore(new_row, new_row_snapshot, old_row_snapshot)
            .await
        {
            Ok(()) => EditOutcome::applied(
                &before,
                &calendar,
                new_row,
                new_start_slot,
                new_duration_slots,
                vec![task_id],
            ),
            Err(e) => EditOutcome::rejected(&before, &calendar, e),
        }
    }

    /// Nudges a task one slot/row in `direction`, clamping at planning edges.
    pub async fn keyboard_nudge(&self, task_id: TaskId, direction: NudgeDirection) -> EditOutcome {
        let _serialize = self.edit_lock.lock().await;

        let (before, horizon) = {
            let store = self.store.read();
            match store.get(task_id) {
                Some(before) => (before, self.horizon(&store)),
                None => return EditOutcome::not_found(task_id),
            }
        };
        let calendar = *self.store.read().calendar();

        match direction {
            NudgeDirection::Left | NudgeDirection::Right => {
                self.keyboard_nudge_horizontal(before, calendar, horizon, direction)
                    .await
            }
            NudgeDirection::Up | NudgeDirection::Down => {
                self.keyboard_nudge_vertical(before, calendar, horizon, direction)
                    .await
            }
        }
    }

    async fn keyboard_nudge_horizontal(
        &self,
        before: Task,
        calendar: calendar::Calendar,
        horizon: SlotIndex,
        direction: NudgeDirection,
    ) -> EditOutcome {
        let row = before.row_id;
        let current_slot = before.start_slot(&calendar);
        let dur_slots = before.duration_slots(&calendar);

        let candidate = match direction {
            NudgeDirection::Left => current_slot.saturating_sub(1),
            NudgeDirection::Right => (current_slot + 1).min(horizon.saturating_sub(dur_slots)),
            _ => unreachable!("horizontal nudge only"),
        };

        if candidate == current_slot {
            return EditOutcome::blocked(&before, &calendar, current_slot);
        }

        let collision_direction = match direction {
            NudgeDirection::Left => Direction::Left,
            NudgeDirection::Right => Direction::Right,
            _ => unreachable!(),
        };

        let has_collision = collision::first_collision(
            &self.store.read(),
            row,
            candidate,
            dur_slots,
            &|id| id == before.id,
        )
        .is_some();

        let moves = if has_collision {
            let chain = {
                let store = self.store.read();
                collision::push_chain(
                    &store,
                    row,
                    before.id,
                    collision_direction,
                    horizon,
                    self.config.keyboard_chain_cap,
                )
            };
            match chain {
                Ok(moves) => moves,
                Err(_) => return EditOutcome::blocked(&before, &calendar, current_slot),
            }
        } else {
            vec![collision::PendingMove { task_id: before.id, new_start_slot: candidate }]
        };

        let row_snapshot = self.store.read().by_row(row);
        {
            let store = self.store.write();
            collision::apply_moves(&store, row, &moves);
        }

        let moved_ids: Vec<TaskId> = moves.iter().map(|m| m.task_id).collect();
        match self.persist_row_or_restore(row, row_snapshot, None).await {
            Ok(()) => EditOutcome::applied(&before, &calendar, row, candidate, dur_slots, moved_ids),
            Err(e) => EditOutcome::rejected(&before, &calendar, e),
        }
    }

    async fn keyboard_nudge_vertical(
        &self,
        before: Task,
        calendar: calendar::Calendar,
        horizon: SlotIndex,
        direction: NudgeDirection,
    ) -> EditOutcome {
        let up = matches!(direction, NudgeDirection::Up);
        let old_row = before.row_id;
        let dur_slots = before.duration_slots(&calendar);
        let start_slot = before.start_slot(&calendar);

        let Some(new_row) = self.store.read().adjacent_row(old_row, up) else {
            return EditOutcome::blocked(&before, &calendar, start_slot);
        };

        let new_row_snapshot = self.store.read().by_row(new_row);
        let old_row_snapshot = self.store.read().by_row(old_row);

        let moves = {
            let store = self.store.read();
            collision::push_right_cascade(&store, new_row, start_slot, dur_slots, before.id, horizon)
        };
        let moves = match moves {
            Ok(m) => m,
            Err(e) => return EditOutcome::rejected(&before, &calendar, e.into()),
        };

        {
            let store = self.store.write();
            collision::apply_moves(&store, new_row, &moves);
            let _ = store.set_position(before.id, new_row, calendar.instant_of(start_slot));
        }

        let mut moved_ids: Vec<TaskId> = moves.iter().map(|m| m.task_id).collect();
        moved_ids.push(before.id);

        match self
            .persist_row_or_restore(new_row, new_row_snapshot, Some((old_row, old_row_snapshot)))
            .await
        {
            Ok(()) => EditOutcome::applied(&before, &calendar, new_row, start_slot, dur_slots, moved_ids),
            Err(e) => EditOutcome::rejected(&before, &calendar, e),
        }
    }
}
