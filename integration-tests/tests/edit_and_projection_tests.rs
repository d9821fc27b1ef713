//! End-to-end scenarios wiring the store, edit coordinator, and read
//! projection together, the way a real edit → re-render round trip works
//! behind the gateway. No database: persistence is a local fake so these
//! can run without Postgres.

use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use coordinator::{CoordinatorConfig, EditCoordinator, NudgeDirection, RowPersister};
use parking_lot::RwLock;
use shared::ids::{PlanningId, RowId, RowKind, TaskId};
use shared::time::Locale;
use store::{PlanningMeta, Row, Task, TaskLinks, TaskStore};

struct RecordingPersister {
    calls: StdMutex<Vec<(RowId, usize)>>,
}

impl RecordingPersister {
    fn new() -> Self {
        Self { calls: StdMutex::new(Vec::new()) }
    }
}

#[async_trait]
impl RowPersister for RecordingPersister {
    async fn persist_row(&self, _planning: PlanningId, row: RowId, tasks: &[Task]) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push((row, tasks.len()));
        Ok(())
    }
}

fn test_calendar() -> calendar::Calendar {
    calendar::Calendar::new(NaiveDate::from_ymd_opt(2025, 8, 11).unwrap(), 3.5)
}

fn task(cal: &calendar::Calendar, id: i64, row: i64, start_slot: u32, duration_slots: u32) -> Task {
    Task {
        id: TaskId::new(id),
        row_id: RowId::new(row),
        affair_id: None,
        name: format!("T{id}"),
        start: cal.instant_of(start_slot),
        duration_hours: cal.slots_to_hours(duration_slots),
        links: TaskLinks::default(),
    }
}

fn build_coordinator(tasks: Vec<Task>) -> (EditCoordinator<RecordingPersister>, Arc<RecordingPersister>) {
    let calendar = test_calendar();
    let meta = PlanningMeta {
        id: PlanningId::new(1),
        name: "Atelier".into(),
        display_type: RowKind::Operator,
        calendar,
        end_date: None,
        filter: None,
        ready: true,
    };
    let rows = vec![
        Row { id: RowId::new(1), name: "R1".into() },
        Row { id: RowId::new(2), name: "R2".into() },
    ];
    let store = Arc::new(RwLock::new(TaskStore::new(meta, rows, tasks, vec![], vec![])));
    let persister = Arc::new(RecordingPersister::new());
    let coordinator = EditCoordinator::new(
        PlanningId::new(1),
        store,
        persister.clone(),
        CoordinatorConfig { min_horizon_slots: 60, horizon_margin_slots: 14, keyboard_chain_cap: 20, row_sweep_cap: 50 },
    );
    (coordinator, persister)
}

#[tokio::test]
async fn move_with_cascade_is_visible_in_the_next_projection() {
    let cal = test_calendar();
    let a = task(&cal, 1, 1, 0, 6);
    let b = task(&cal, 2, 1, 8, 4);
    let (coord, persister) = build_coordinator(vec![a, b]);

    let outcome = coord.move_task(TaskId::new(1), RowId::new(1), 6).await;
    assert!(outcome.success);
    assert_eq!(outcome.moved, vec![TaskId::new(2)]);

    let store = coord.store().read();
    let projection = projection::project(&store, 40, Locale::Fr);
    let moved_task = projection.tasks.iter().find(|t| t.task.id == TaskId::new(1)).unwrap();
    let pushed_task = projection.tasks.iter().find(|t| t.task.id == TaskId::new(2)).unwrap();
    assert_eq!(moved_task.start_slot, 6);
    assert_eq!(pushed_task.start_slot, 12);

    // Every row that changed was persisted, and only that row.
    let calls = persister.calls.lock().unwrap();
    assert!(calls.iter().all(|(row, _)| *row == RowId::new(1)));
}

#[tokio::test]
async fn keyboard_left_pushes_neighbor_then_reprojects_correctly() {
    let cal = test_calendar();
    let a = task(&cal, 1, 1, 4, 4);
    let b = task(&cal, 2, 1, 0, 4);
    let (coord, _persister) = build_coordinator(vec![a, b]);

    let outcome = coord.keyboard_nudge(TaskId::new(1), NudgeDirection::Left).await;
    assert!(outcome.success);

    let store = coord.store().read();
    let projection = projection::project(&store, 40, Locale::Fr);
    let neighbor = projection.tasks.iter().find(|t| t.task.id == TaskId::new(2)).unwrap();
    // `b` had nowhere to go but right, off of slot 0.
    assert!(neighbor.start_slot >= 4);
}

#[tokio::test]
async fn blocked_move_persists_nothing_and_projection_is_unchanged() {
    let cal = test_calendar();
    let filler = task(&cal, 1, 1, 0, 60);
    let other = task(&cal, 2, 2, 0, 4);
    let (coord, persister) = build_coordinator(vec![filler, other]);

    let before = {
        let store = coord.store().read();
        projection::project(&store, 40, Locale::Fr)
    };

    let outcome = coord.move_task(TaskId::new(2), RowId::new(1), 0).await;
    assert!(!outcome.success);
    assert!(persister.calls.lock().unwrap().is_empty());

    let store = coord.store().read();
    let after = projection::project(&store, 40, Locale::Fr);
    let before_task = before.tasks.iter().find(|t| t.task.id == TaskId::new(2)).unwrap();
    let after_task = after.tasks.iter().find(|t| t.task.id == TaskId::new(2)).unwrap();
    assert_eq!(before_task.start_slot, after_task.start_slot);
}
