//! External capability port for the propagator.
//!
//! The propagator never talks to the upstream work-order tables directly —
//! `planning-persistence` implements this trait for Postgres, the same way
//! `coordinator::RowPersister` decouples the edit coordinator from storage.

use async_trait::async_trait;
use chrono::NaiveDateTime;

#[derive(Debug, Clone, Copy)]
pub struct ProductionRecord {
    pub id: i64,
    pub planned_start: NaiveDateTime,
}

/// One row of an upstream work order's routing, in the order operations
/// are performed.
#[derive(Debug, Clone, Copy)]
pub struct OperationLine {
    pub id: i64,
    pub work_order_id: i64,
    pub sequence: i32,
    /// Hours that must elapse on the next workcenter's calendar before the
    /// next operation can start, once this one is underway.
    pub post_transition_hours: f64,
    /// Percentage of this line's actual duration the next line is allowed
    /// to start early by (pipelined operations).
    pub overlap_pct: f64,
    pub remaining_work_hours: f64,
    pub workcenter_id: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct LineUpdate {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub unit_duration_hours: f64,
    pub employee_id: Option<i64>,
}

#[async_trait]
pub trait WorkOrderGateway: Send + Sync {
    async fn production_for(&self, production_id: i64) -> anyhow::Result<Option<ProductionRecord>>;

    async fn set_production_start(&self, production_id: i64, start: NaiveDateTime) -> anyhow::Result<()>;

    async fn set_production_primary_workcenter(
        &self,
        production_id: i64,
        workcenter_id: i64,
        duration_hours: f64,
    ) -> anyhow::Result<()>;

    /// Routing lines for a work order; the caller sorts them.
    async fn operation_lines(&self, work_order_id: i64) -> anyhow::Result<Vec<OperationLine>>;

    /// `start + duration_hours` worked out on `workcenter_id`'s own
    /// availability calendar, skipping closed periods.
    async fn earliest_end(
        &self,
        workcenter_id: i64,
        duration_hours: f64,
        start: NaiveDateTime,
    ) -> anyhow::Result<NaiveDateTime>;

    async fn apply_line_update(&self, line_id: i64, update: LineUpdate) -> anyhow::Result<()>;
}
