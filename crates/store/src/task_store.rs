//! In-memory authoritative task set for one loaded planning.
//!
//! Follows the same shape as an `OrderService` (`orders-service/src/service.rs`):
//! a `DashMap` keyed by id holding per-task state, plus a secondary index
//! for the one grouping the service looks up by (there: account orders;
//! here: row). Unlike that service, mutation here is exclusively reached
//! through the collision/coordinator crates under one outer lock, so the
//! by-id map does not need its own per-entry lock.

use calendar::{Calendar, SlotIndex};
use dashmap::DashMap;
use shared::ids::{AffairId, RowId, RowKind, TaskId};

use crate::model::{Affair, Closure, PlanningMeta, Row, Task};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("task {0} not found")]
    TaskNotFound(TaskId),
    #[error("row {0} not found")]
    RowNotFound(RowId),
}

pub struct TaskStore {
    pub meta: PlanningMeta,
    rows: Vec<Row>,
    tasks: DashMap<TaskId, Task>,
    row_index: DashMap<RowId, Vec<TaskId>>,
    affairs: DashMap<AffairId, Affair>,
    closures: Vec<Closure>,
}

impl TaskStore {
    pub fn new(
        meta: PlanningMeta,
        rows: Vec<Row>,
        tasks: Vec<Task>,
        affairs: Vec<Affair>,
        closures: Vec<Closure>,
    ) -> Self {
        let store = Self {
            meta,
            rows,
            tasks: DashMap::new(),
            row_index: DashMap::new(),
            affairs: affairs.into_iter().map(|a| (a.id, a)).collect(),
            closures,
        };
        for task in tasks {
            store.index_insert(&task);
            store.tasks.insert(task.id, task);
        }
        store
    }

    pub fn calendar(&self) -> &Calendar {
        &self.meta.calendar
    }

    pub fn display_type(&self) -> RowKind {
        self.meta.display_type
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn affairs(&self) -> Vec<Affair> {
        self.affairs.iter().map(|e| e.value().clone()).collect()
    }

    pub fn closures(&self) -> &[Closure] {
        &self.closures
    }

    /// Row order index used for up/down keyboard nudges.
    pub fn row_position(&self, row_id: RowId) -> Option<usize> {
        self.rows.iter().position(|r| r.id == row_id)
    }

    pub fn adjacent_row(&self, row_id: RowId, up: bool) -> Option<RowId> {
        let pos = self.row_position(row_id)?;
        if up {
            pos.checked_sub(1).map(|i| self.rows[i].id)
        } else {
            self.rows.get(pos + 1).map(|r| r.id)
        }
    }

    pub fn get(&self, id: TaskId) -> Option<Task> {
        self.tasks.get(&id).map(|t| t.value().clone())
    }

    pub fn all_tasks(&self) -> Vec<Task> {
        self.tasks.iter().map(|e| e.value().clone()).collect()
    }

    /// Tasks on `row`, ascending start slot, ties broken by task id.
    pub fn by_row(&self, row: RowId) -> Vec<Task> {
        let Some(ids) = self.row_index.get(&row) else {
            return Vec::new();
        };
        let calendar = self.calendar();
        let mut tasks: Vec<Task> = ids
            .iter()
            .filter_map(|id| self.tasks.get(id).map(|t| t.value().clone()))
            .collect();
        tasks.sort_by_key(|t| (t.start_slot(calendar), t.id));
        tasks
    }

    pub fn closed(&self, row: RowId, slot: SlotIndex) -> bool {
        let date = self.calendar().date_of(slot);
        self.closures
            .iter()
            .any(|c| c.date == date && c.row_id.map_or(true, |r| r == row))
    }

    /// Replaces every task on `row` with `tasks`, leaving other rows
    /// untouched. Used by the coordinator to snapshot/restore a row
    /// atomically around a persistence round-trip.
    pub fn restore_row(&self, row: RowId, tasks: Vec<Task>) {
        if let Some(ids) = self.row_index.get(&row) {
            for id in ids.iter() {
                self.tasks.remove(id);
            }
        }
        self.row_index.insert(row, tasks.iter().map(|t| t.id).collect());
        for task in tasks {
            self.tasks.insert(task.id, task);
        }
    }

    pub fn set_position(
        &self,
        id: TaskId,
        new_row: RowId,
        new_start: chrono::NaiveDateTime,
    ) -> Result<(), StoreError> {
        let mut entry = self.tasks.get_mut(&id).ok_or(StoreError::TaskNotFound(id))?;
        let old_row = entry.row_id;
        entry.row_id = new_row;
        entry.start = new_start;
        drop(entry);
        if old_row != new_row {
            self.index_remove(old_row, id);
            self.index_add(new_row, id);
        }
        Ok(())
    }

    pub fn set_duration(&self, id: TaskId, duration_hours: f64) -> Result<(), StoreError> {
        let mut entry = self.tasks.get_mut(&id).ok_or(StoreError::TaskNotFound(id))?;
        entry.duration_hours = duration_hours;
        Ok(())
    }

    fn index_insert(&self, task: &Task) {
        self.index_add(task.row_id, task.id);
    }

    fn index_add(&self, row: RowId, id: TaskId) {
        self.row_index.entry(row).or_default().push(id);
    }

    fn index_remove(&self, row: RowId, id: TaskId) {
        if let Some(mut ids) = self.row_index.get_mut(&row) {
            ids.retain(|existing| *existing != id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shared::ids::PlanningId;

    fn meta() -> PlanningMeta {
        PlanningMeta {
            id: PlanningId::new(1),
            name: "Atelier".to_string(),
            display_type: RowKind::Operator,
            calendar: Calendar::new(NaiveDate::from_ymd_opt(2025, 8, 11).unwrap(), 3.5),
            end_date: None,
            filter: None,
            ready: true,
        }
    }

    fn task(id: i64, row: i64, start: chrono::NaiveDateTime, hours: f64) -> Task {
        Task {
            id: TaskId::new(id),
            row_id: RowId::new(row),
            affair_id: None,
            name: format!("T{id}"),
            start,
            duration_hours: hours,
            links: Default::default(),
        }
    }

    #[test]
    fn by_row_orders_by_start_then_id() {
        let cal = Calendar::new(NaiveDate::from_ymd_opt(2025, 8, 11).unwrap(), 3.5);
        let t1 = task(1, 1, cal.instant_of(4), 3.5);
        let t2 = task(2, 1, cal.instant_of(0), 3.5);
        let store = TaskStore::new(
            meta(),
            vec![Row { id: RowId::new(1), name: "A".into() }],
            vec![t1, t2],
            vec![],
            vec![],
        );
        let ordered = store.by_row(RowId::new(1));
        assert_eq!(ordered[0].id, TaskId::new(2));
        assert_eq!(ordered[1].id, TaskId::new(1));
    }

    #[test]
    fn restore_row_replaces_index() {
        let cal = Calendar::new(NaiveDate::from_ymd_opt(2025, 8, 11).unwrap(), 3.5);
        let t1 = task(1, 1, cal.instant_of(0), 3.5);
        let store = TaskStore::new(
            meta(),
            vec![Row { id: RowId::new(1), name: "A".into() }],
            vec![t1.clone()],
            vec![],
            vec![],
        );
        let mut moved = t1.clone();
        moved.start = cal.instant_of(10);
        store.restore_row(RowId::new(1), vec![moved]);
        let after = store.by_row(RowId::new(1));
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].start_slot(&cal), 10);
    }

    #[test]
    fn closed_matches_global_and_row_scoped() {
        let cal = Calendar::new(NaiveDate::from_ymd_opt(2025, 8, 11).unwrap(), 3.5);
        let global = Closure { date: cal.date_of(0), row_id: None };
        let scoped = Closure { date: cal.date_of(4), row_id: Some(RowId::new(2)) };
        let store = TaskStore::new(
            meta(),
            vec![Row { id: RowId::new(1), name: "A".into() }],
            vec![],
            vec![],
            vec![global, scoped],
        );
        assert!(store.closed(RowId::new(1), 0));
        assert!(store.closed(RowId::new(1), 1));
        assert!(!store.closed(RowId::new(1), 4));
        assert!(store.closed(RowId::new(2), 4));
    }
}
