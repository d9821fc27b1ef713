//! Read-only composition of a loaded planning into the shape the client
//! consumes: slot axis with day/week/month headers, a per-row closure
//! map, and tasks annotated with their derived slot position.
//!
//! Grounded on the reference loader's header-generation loop
//! (`flask-htmx/gestionnaire-de-taches/app.py`, the block building
//! `time_slots`/`months`/`weeks`/`days` by walking every slot and
//! extending the last group while its key matches), translated from a
//! French-only table into the `Locale`-driven `shared::time` helper.

use std::collections::HashMap;

use calendar::{Calendar, SlotIndex};
use chrono::Datelike;
use serde::Serialize;
use shared::ids::RowId;
use shared::time::Locale;
use store::{Row, Task, TaskStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Period {
    Am,
    Pm,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotHeader {
    pub slot: SlotIndex,
    pub date: chrono::NaiveDate,
    pub period: Period,
    pub day_name: String,
    pub closed_global: bool,
}

/// One labelled span of consecutive slots sharing a day, ISO week, or
/// month.
#[derive(Debug, Clone, Serialize)]
pub struct GroupHeader {
    pub label: String,
    pub start_slot: SlotIndex,
    pub span: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectedTask {
    #[serde(flatten)]
    pub task: Task,
    pub start_slot: SlotIndex,
    pub duration_slots: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanningProjection {
    pub rows: Vec<Row>,
    pub horizon: SlotIndex,
    pub slots: Vec<SlotHeader>,
    pub days: Vec<GroupHeader>,
    pub weeks: Vec<GroupHeader>,
    pub months: Vec<GroupHeader>,
    pub closed_row: HashMap<RowId, Vec<bool>>,
    pub tasks: Vec<ProjectedTask>,
}

pub fn project(store: &TaskStore, horizon: SlotIndex, locale: Locale) -> PlanningProjection {
    let calendar = store.calendar();

    let mut slots = Vec::with_capacity(horizon as usize);
    let mut days: Vec<GroupHeader> = Vec::new();
    let mut weeks: Vec<GroupHeader> = Vec::new();
    let mut months: Vec<GroupHeader> = Vec::new();

    for slot in 0..horizon {
        let date = calendar.date_of(slot);
        let period = if slot % 2 == 0 { Period::Am } else { Period::Pm };
        let day_name = locale.weekday_name(date.weekday()).to_string();
        let closed_global = store.closures().iter().any(|c| c.row_id.is_none() && c.date == date);

        extend_group(&mut days, date.format("%d/%m").to_string(), slot);
        extend_group(&mut weeks, week_label(date), slot);
        extend_group(&mut months, date.format("%m/%Y").to_string(), slot);

        slots.push(SlotHeader {
            slot,
            date,
            period,
            day_name,
            closed_global,
        });
    }

    let rows = store.rows().to_vec();
    let mut closed_row = HashMap::with_capacity(rows.len());
    for row in &rows {
        let mask = (0..horizon).map(|slot| store.closed(row.id, slot)).collect();
        closed_row.insert(row.id, mask);
    }

    let tasks = store
        .all_tasks()
        .into_iter()
        .map(|task| project_task(task, calendar))
        .collect();

    PlanningProjection {
        rows,
        horizon,
        slots,
        days,
        weeks,
        months,
        closed_row,
        tasks,
    }
}

fn project_task(task: Task, calendar: &Calendar) -> ProjectedTask {
    let start_slot = task.start_slot(calendar);
    let duration_slots = task.duration_slots(calendar);
    ProjectedTask {
        task,
        start_slot,
        duration_slots,
    }
}

/// `"S{ww}/{YYYY}"`, ISO week number and ISO week-year.
fn week_label(date: chrono::NaiveDate) -> String {
    let iso = date.iso_week();
    format!("S{:02}/{}", iso.week(), iso.year())
}

fn extend_group(groups: &mut Vec<GroupHeader>, label: String, slot: SlotIndex) {
    match groups.last_mut() {
        Some(last) if last.label == label && key_matches_current_span(last, slot) => {
            last.span += 1;
        }
        _ => groups.push(GroupHeader {
            label,
            start_slot: slot,
            span: 1,
        }),
    }
}

/// Guards against two non-adjacent spans sharing a label (e.g. the same
/// ISO week label recurring a year apart never happens within one
/// planning horizon, but matching purely on `label` would still be
/// wrong in principle) by requiring the new slot to be contiguous.
fn key_matches_current_span(last: &GroupHeader, slot: SlotIndex) -> bool {
    last.start_slot + last.span == slot
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shared::ids::{PlanningId, RowKind};
    use store::PlanningMeta;

    fn store_with_horizon_start(start: NaiveDate) -> TaskStore {
        let meta = PlanningMeta {
            id: PlanningId::new(1),
            name: "Atelier".into(),
            display_type: RowKind::Operator,
            calendar: Calendar::new(start, 3.5),
            end_date: None,
            filter: None,
            ready: true,
        };
        TaskStore::new(meta, vec![Row { id: RowId::new(1), name: "A".into() }], vec![], vec![], vec![])
    }

    #[test]
    fn day_groups_span_two_slots_each() {
        let store = store_with_horizon_start(NaiveDate::from_ymd_opt(2025, 8, 11).unwrap());
        let projection = project(&store, 6, Locale::Fr);
        assert_eq!(projection.days.len(), 3);
        assert!(projection.days.iter().all(|d| d.span == 2));
    }

    #[test]
    fn week_label_uses_iso_format() {
        let store = store_with_horizon_start(NaiveDate::from_ymd_opt(2025, 8, 11).unwrap());
        let projection = project(&store, 2, Locale::Fr);
        assert_eq!(projection.weeks[0].label, "S33/2025");
    }

    #[test]
    fn closed_row_reflects_global_and_scoped_closures() {
        let mut store = store_with_horizon_start(NaiveDate::from_ymd_opt(2025, 8, 11).unwrap());
        let meta = store.meta.clone();
        store = TaskStore::new(
            meta,
            vec![Row { id: RowId::new(1), name: "A".into() }],
            vec![],
            vec![],
            vec![store::Closure { date: NaiveDate::from_ymd_opt(2025, 8, 12).unwrap(), row_id: None }],
        );
        let projection = project(&store, 4, Locale::Fr);
        assert!(projection.slots[2].closed_global);
        assert!(projection.closed_row[&RowId::new(1)][2]);
    }
}
