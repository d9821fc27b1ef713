//! Overlap detection and cascade-push resolution for a single row.
//!
//! Grounded on the reference's `check_collision`, `push_all_colliding_tasks_right`,
//! `push_task_cascade`, and `resolve_all_collisions_on_operator`
//! (`is_bsa_flask14/.../app.py`). The reference mutates a module-global
//! task list in place; here every function reads an immutable `&TaskStore`
//! snapshot and returns a batch of `PendingMove`s for the caller to commit
//! atomically in one pass rather than mutating tasks as it walks the row.

use std::collections::HashSet;

use calendar::SlotIndex;
use shared::ids::{RowId, TaskId};
use store::{Task, TaskStore};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CollisionError {
    #[error("not enough space")]
    OutOfSpace,
    #[error("push chain exceeded its step cap")]
    ChainTooLong,
    #[error("row sweep exceeded its iteration cap")]
    SweepCapExceeded,
    #[error("task {0} not found")]
    TaskNotFound(TaskId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMove {
    pub task_id: TaskId,
    pub new_start_slot: SlotIndex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

pub fn overlaps(a_start: SlotIndex, a_dur: SlotIndex, b_start: SlotIndex, b_dur: SlotIndex) -> bool {
    let (a_end, b_end) = (a_start + a_dur, b_start + b_dur);
    !(a_end <= b_start || b_end <= a_start)
}

fn candidates(store: &TaskStore, row: RowId, exclude: &dyn Fn(TaskId) -> bool) -> Vec<Task> {
    store
        .by_row(row)
        .into_iter()
        .filter(|t| !exclude(t.id))
        .collect()
}

pub fn first_collision(
    store: &TaskStore,
    row: RowId,
    start: SlotIndex,
    dur: SlotIndex,
    exclude: &dyn Fn(TaskId) -> bool,
) -> Option<Task> {
    let calendar = store.calendar();
    candidates(store, row, exclude)
        .into_iter()
        .find(|t| overlaps(start, dur, t.start_slot(calendar), t.duration_slots(calendar)))
}

pub fn all_collisions(
    store: &TaskStore,
    row: RowId,
    start: SlotIndex,
    dur: SlotIndex,
    exclude: &dyn Fn(TaskId) -> bool,
) -> Vec<Task> {
    let calendar = store.calendar();
    candidates(store, row, exclude)
        .into_iter()
        .filter(|t| overlaps(start, dur, t.start_slot(calendar), t.duration_slots(calendar)))
        .collect()
}

/// Pushes every task right of `start` that would now overlap, cascading
/// through whatever they in turn collide with. `excl` is the task being
/// placed; it is never itself among the tasks pushed.
pub fn push_right_cascade(
    store: &TaskStore,
    row: RowId,
    start: SlotIndex,
    dur: SlotIndex,
    excl: TaskId,
    horizon: SlotIndex,
) -> Result<Vec<PendingMove>, CollisionError> {
    let calendar = store.calendar();
    let mut moved_ids: HashSet<TaskId> = HashSet::from([excl]);
    let mut moves: Vec<PendingMove> = Vec::new();

    let mut working = all_collisions(store, row, start, dur, &|id| moved_ids.contains(&id));
    let mut cursor = start + dur;

    while !working.is_empty() {
        working.sort_by_key(|t| t.start_slot(calendar));
        let mut next_cascade = Vec::new();

        for t in &working {
            let t_dur = t.duration_slots(calendar);
            let new_start = cursor;
            if new_start + t_dur > horizon {
                return Err(CollisionError::OutOfSpace);
            }
            moves.push(PendingMove { task_id: t.id, new_start_slot: new_start });
            moved_ids.insert(t.id);
            cursor += t_dur;

            let collided = all_collisions(store, row, new_start, t_dur, &|id| moved_ids.contains(&id));
            next_cascade.extend(collided);
        }

        working = next_cascade;
    }

    Ok(moves)
}

/// Walks a single-step push chain in `direction`, at most `cap` steps.
pub fn push_chain(
    store: &TaskStore,
    row: RowId,
    initiating: TaskId,
    direction: Direction,
    horizon: SlotIndex,
    cap: u32,
) -> Result<Vec<PendingMove>, CollisionError> {
    let calendar = store.calendar();
    let mut current = store.get(initiating).ok_or(CollisionError::TaskNotFound(initiating))?;
    let mut boundary = match direction {
        Direction::Left => current.start_slot(calendar),
        Direction::Right => current.end_slot(calendar),
    };
    let mut chain_ids: HashSet<TaskId> = HashSet::from([initiating]);
    let mut moves = Vec::new();

    for _ in 0..cap {
        let dur = current.duration_slots(calendar);
        let candidate = match direction {
            Direction::Left => boundary.checked_sub(dur).ok_or(CollisionError::OutOfSpace)?,
            Direction::Right => boundary,
        };
        if direction == Direction::Right && candidate + dur > horizon {
            return Err(CollisionError::OutOfSpace);
        }

        moves.push(PendingMove { task_id: current.id, new_start_slot: candidate });
        boundary = match direction {
            Direction::Left => candidate,
            Direction::Right => candidate + dur,
        };

        match first_collision(store, row, candidate, dur, &|id| chain_ids.contains(&id)) {
            Some(next) => {
                chain_ids.insert(next.id);
                current = next;
            }
            None => return Ok(moves),
        }
    }

    Err(CollisionError::ChainTooLong)
}

/// Sweeps the whole row for overlaps, hard-bounded at `cap` restart iterations.
pub fn resolve_all_collisions(
    store: &TaskStore,
    row: RowId,
    horizon: SlotIndex,
    cap: u32,
) -> Result<Vec<PendingMove>, CollisionError> {
    let calendar = store.calendar();
    let original = store.by_row(row);
    let mut tasks = original.clone();

    for _ in 0..cap {
        tasks.sort_by_key(|t| (t.start_slot(calendar), t.id));
        let mut changed = false;

        for i in 0..tasks.len().saturating_sub(1) {
            let left_end = tasks[i].end_slot(calendar);
            let right_start = tasks[i + 1].start_slot(calendar);
            if left_end > right_start {
                let right_dur = tasks[i + 1].duration_slots(calendar);
                let new_right_start = left_end;
                if new_right_start + right_dur > horizon {
                    let left_dur = tasks[i].duration_slots(calendar);
                    match right_start.checked_sub(left_dur) {
                        Some(new_left_start) => {
                            tasks[i].start = calendar.instant_of(new_left_start);
                        }
                        None => {
                            tasks[i + 1].start = calendar.instant_of(horizon - right_dur);
                        }
                    }
                } else {
                    tasks[i + 1].start = calendar.instant_of(new_right_start);
                }
                changed = true;
                break;
            }
        }

        if !changed {
            return Ok(diff_moves(calendar, &original, &tasks));
        }
    }

    Err(CollisionError::SweepCapExceeded)
}

fn diff_moves(calendar: &calendar::Calendar, original: &[Task], swept: &[Task]) -> Vec<PendingMove> {
    swept
        .iter()
        .filter_map(|t| {
            let before = original.iter().find(|o| o.id == t.id)?;
            (before.start != t.start).then(|| PendingMove {
                task_id: t.id,
                new_start_slot: t.start_slot(calendar),
            })
        })
        .collect()
}

/// Applies a batch of moves to `store`, keeping each task's row unchanged.
pub fn apply_moves(store: &TaskStore, row: RowId, moves: &[PendingMove]) {
    let calendar = *store.calendar();
    for m in moves {
        let _ = store.set_position(m.task_id, row, calendar.instant_of(m.new_start_slot));
    }
}
