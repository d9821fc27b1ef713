//! Domain types held by a loaded planning: rows, tasks, affairs, closures.
//!
//! Grounded on spec's data model (§3) and the reference loader's table
//! shapes (`is_ordre_travail_line`, `is_gestion_tache`,
//! `is_gestion_tache_fermeture`) in `is_bsa_flask14`.

use calendar::{Calendar, SlotIndex};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use shared::ids::{AffairId, PlanningId, RowId, RowKind, TaskId};

pub const DEFAULT_AFFAIR_COLOR: &str = "#808080";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Affair {
    pub id: AffairId,
    pub name: String,
    pub color: String,
}

impl Affair {
    pub fn new(id: AffairId, name: impl Into<String>, color: Option<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color: color.unwrap_or_else(|| DEFAULT_AFFAIR_COLOR.to_string()),
        }
    }
}

/// A date (optionally scoped to one row) marking a display-only
/// unavailability. Closures never block placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Closure {
    pub date: NaiveDate,
    pub row_id: Option<RowId>,
}

/// Back-pointers a task may carry into the upstream work-order model.
/// Populated by the loader, consumed by the propagator; the core never
/// interprets these beyond passing them through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskLinks {
    pub order_id: Option<i64>,
    pub production_id: Option<i64>,
    pub work_order_id: Option<i64>,
    pub operation_line_id: Option<i64>,
    pub remaining_quantity: Option<f64>,
    pub last_required_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub row_id: RowId,
    pub affair_id: Option<AffairId>,
    pub name: String,
    pub start: NaiveDateTime,
    pub duration_hours: f64,
    pub links: TaskLinks,
}

impl Task {
    pub fn start_slot(&self, calendar: &Calendar) -> SlotIndex {
        calendar.slot_of(self.start)
    }

    pub fn duration_slots(&self, calendar: &Calendar) -> u32 {
        calendar.hours_to_slots(self.duration_hours)
    }

    pub fn end_slot(&self, calendar: &Calendar) -> SlotIndex {
        self.start_slot(calendar) + self.duration_slots(calendar)
    }
}

/// Planning attributes that are not consumed by any scheduling operation
/// (`name`, `filter`, `ready`) are still carried here: populating them is
/// the loader's business, but the core is the thing holding the planning
/// in memory, so it owns the struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningMeta {
    pub id: PlanningId,
    pub name: String,
    pub display_type: RowKind,
    pub calendar: Calendar,
    pub end_date: Option<NaiveDate>,
    pub filter: Option<String>,
    pub ready: bool,
}
