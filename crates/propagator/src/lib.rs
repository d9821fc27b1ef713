//! Operator-triggered propagation passes from the planning back onto the
//! upstream work-order model.
//!
//! Both passes are best-effort: a failure on one production or work order
//! is logged and counted, never aborts the batch, since upstream writes
//! fail for reasons that have nothing to do with scheduling (locks,
//! permissions) — a swallow-and-count posture toward per-item failures
//! rather than aborting the whole propagation run.

pub mod gateway;

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use shared::ids::RowKind;
use store::Task;

pub use gateway::{LineUpdate, OperationLine, ProductionRecord, WorkOrderGateway};

#[derive(Debug, Default, Clone, Serialize, PartialEq)]
pub struct PropagationReport {
    pub productions_shifted: u32,
    pub operations_recomputed: u32,
    pub employee_assignments_changed: u32,
    pub durations_updated: u32,
    pub failures: u32,
}

impl PropagationReport {
    fn merge(&mut self, other: PropagationReport) {
        self.productions_shifted += other.productions_shifted;
        self.operations_recomputed += other.operations_recomputed;
        self.employee_assignments_changed += other.employee_assignments_changed;
        self.durations_updated += other.durations_updated;
        self.failures += other.failures;
    }
}

fn hours_duration(hours: f64) -> Duration {
    Duration::milliseconds((hours * 3_600_000.0).round() as i64)
}

/// Shift each production's planned start by the delta between its current
/// value and the earliest task bound to it; on workcenter-typed plannings,
/// also carry that task's row (workcenter) and duration onto the
/// production's primary work-order record.
pub async fn propagate_production_starts(
    tasks: &[Task],
    display_type: RowKind,
    gateway: &dyn WorkOrderGateway,
) -> PropagationReport {
    let mut by_production: HashMap<i64, Vec<&Task>> = HashMap::new();
    for task in tasks {
        if let Some(production_id) = task.links.production_id {
            by_production.entry(production_id).or_default().push(task);
        }
    }

    let mut report = PropagationReport::default();
    for (production_id, group) in by_production {
        match propagate_one_production(production_id, &group, display_type, gateway).await {
            Ok(()) => report.productions_shifted += 1,
            Err(err) => {
                tracing::warn!(production_id, error = %err, "failed to propagate production start date");
                report.failures += 1;
            }
        }
    }
    report
}

async fn propagate_one_production(
    production_id: i64,
    tasks: &[&Task],
    display_type: RowKind,
    gateway: &dyn WorkOrderGateway,
) -> anyhow::Result<()> {
    let min_task = tasks
        .iter()
        .min_by_key(|t| t.start)
        .expect("group built from a non-empty push is never empty");

    let production = gateway
        .production_for(production_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("production {production_id} not found"))?;

    let delta = min_task.start - production.planned_start;
    let new_start = production.planned_start + delta;
    gateway.set_production_start(production_id, new_start).await?;

    if display_type == RowKind::Workcenter {
        gateway
            .set_production_primary_workcenter(production_id, min_task.row_id.get(), min_task.duration_hours)
            .await?;
    }
    Ok(())
}

/// Bind each operation line's start/end, unit duration, and employee to the
/// task that represents it, chaining subsequent lines off the previous
/// line's transition time and overlap percentage.
pub async fn propagate_operation_lines(tasks: &[Task], gateway: &dyn WorkOrderGateway) -> PropagationReport {
    let mut by_work_order: HashMap<i64, Vec<&Task>> = HashMap::new();
    for task in tasks {
        if let Some(work_order_id) = task.links.work_order_id {
            by_work_order.entry(work_order_id).or_default().push(task);
        }
    }

    let mut report = PropagationReport::default();
    for (work_order_id, group) in by_work_order {
        match propagate_one_work_order(&group, gateway).await {
            Ok(group_report) => report.merge(group_report),
            Err(err) => {
                tracing::warn!(work_order_id, error = %err, "failed to propagate operation lines");
                report.failures += 1;
            }
        }
    }
    report
}

async fn propagate_one_work_order(
    tasks: &[&Task],
    gateway: &dyn WorkOrderGateway,
) -> anyhow::Result<PropagationReport> {
    let work_order_id = tasks[0]
        .links
        .work_order_id
        .expect("caller only groups tasks that carry a work_order_id");

    let mut lines = gateway.operation_lines(work_order_id).await?;
    lines.sort_by_key(|l| (l.sequence, l.id));

    let task_for_line =
        |line_id: i64| tasks.iter().find(|t| t.links.operation_line_id == Some(line_id)).copied();

    let mut report = PropagationReport::default();
    // (line, the task's own start, the task's own duration) of the most
    // recently bound line, used as the chaining anchor for the next one.
    let mut previous: Option<(OperationLine, NaiveDateTime, f64)> = None;

    for line in &lines {
        let Some(task) = task_for_line(line.id) else {
            continue;
        };

        let start = match &previous {
            None => task.start,
            Some((prev_line, prev_start, prev_duration_hours)) => {
                let prev_end = gateway
                    .earliest_end(prev_line.workcenter_id, *prev_duration_hours, *prev_start)
                    .await?;
                let advanced = gateway
                    .earliest_end(line.workcenter_id, prev_line.post_transition_hours, prev_end)
                    .await?;
                let overlap_hours = prev_duration_hours * (line.overlap_pct / 100.0);
                advanced - hours_duration(overlap_hours)
            }
        };

        let end = gateway.earliest_end(line.workcenter_id, line.remaining_work_hours, start).await?;

        gateway
            .apply_line_update(
                line.id,
                LineUpdate {
                    start,
                    end,
                    unit_duration_hours: task.duration_hours,
                    employee_id: Some(task.row_id.get()),
                },
            )
            .await?;

        report.operations_recomputed += 1;
        report.durations_updated += 1;
        report.employee_assignments_changed += 1;
        previous = Some((*line, start, task.duration_hours));
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use parking_lot::Mutex;
    use shared::ids::{RowId, TaskId};
    use store::TaskLinks;

    struct FakeGateway {
        productions: Mutex<HashMap<i64, ProductionRecord>>,
        lines: HashMap<i64, Vec<OperationLine>>,
        updates: Mutex<Vec<(i64, LineUpdate)>>,
    }

    #[async_trait]
    impl WorkOrderGateway for FakeGateway {
        async fn production_for(&self, production_id: i64) -> anyhow::Result<Option<ProductionRecord>> {
            Ok(self.productions.lock().get(&production_id).copied())
        }

        async fn set_production_start(&self, production_id: i64, start: NaiveDateTime) -> anyhow::Result<()> {
            self.productions.lock().get_mut(&production_id).unwrap().planned_start = start;
            Ok(())
        }

        async fn set_production_primary_workcenter(
            &self,
            _production_id: i64,
            _workcenter_id: i64,
            _duration_hours: f64,
        ) -> anyhow::Result<()> {
            Ok(())
        }

        async fn operation_lines(&self, work_order_id: i64) -> anyhow::Result<Vec<OperationLine>> {
            Ok(self.lines.get(&work_order_id).cloned().unwrap_or_default())
        }

        async fn earliest_end(
            &self,
            _workcenter_id: i64,
            duration_hours: f64,
            start: NaiveDateTime,
        ) -> anyhow::Result<NaiveDateTime> {
            Ok(start + hours_duration(duration_hours))
        }

        async fn apply_line_update(&self, line_id: i64, update: LineUpdate) -> anyhow::Result<()> {
            self.updates.lock().push((line_id, update));
            Ok(())
        }
    }

    fn task(id: i64, row: i64, start: NaiveDateTime, hours: f64, links: TaskLinks) -> Task {
        Task {
            id: TaskId::new(id),
            row_id: RowId::new(row),
            affair_id: None,
            name: format!("T{id}"),
            start,
            duration_hours: hours,
            links,
        }
    }

    fn dt(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 8, day).unwrap().and_hms_opt(hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn production_start_shifts_to_earliest_bound_task() {
        let gateway = FakeGateway {
            productions: Mutex::new(HashMap::from([(
                10,
                ProductionRecord { id: 10, planned_start: dt(1, 8) },
            )])),
            lines: HashMap::new(),
            updates: Mutex::new(Vec::new()),
        };
        let links = TaskLinks { production_id: Some(10), ..Default::default() };
        let tasks = vec![
            task(1, 1, dt(5, 8), 4.0, links.clone()),
            task(2, 1, dt(3, 8), 4.0, links),
        ];

        let report = propagate_production_starts(&tasks, RowKind::Operator, &gateway).await;
        assert_eq!(report.productions_shifted, 1);
        assert_eq!(report.failures, 0);
        assert_eq!(gateway.productions.lock().get(&10).unwrap().planned_start, dt(3, 8));
    }

    #[tokio::test]
    async fn missing_production_is_counted_as_a_failure_without_aborting() {
        let gateway = FakeGateway {
            productions: Mutex::new(HashMap::new()),
            lines: HashMap::new(),
            updates: Mutex::new(Vec::new()),
        };
        let links = TaskLinks { production_id: Some(999), ..Default::default() };
        let tasks = vec![task(1, 1, dt(1, 8), 4.0, links)];

        let report = propagate_production_starts(&tasks, RowKind::Operator, &gateway).await;
        assert_eq!(report.productions_shifted, 0);
        assert_eq!(report.failures, 1);
    }

    #[tokio::test]
    async fn operation_lines_chain_off_transition_and_overlap() {
        let lines = vec![
            OperationLine {
                id: 1,
                work_order_id: 77,
                sequence: 1,
                post_transition_hours: 2.0,
                overlap_pct: 0.0,
                remaining_work_hours: 4.0,
                workcenter_id: 100,
            },
            OperationLine {
                id: 2,
                work_order_id: 77,
                sequence: 2,
                post_transition_hours: 0.0,
                overlap_pct: 50.0,
                remaining_work_hours: 6.0,
                workcenter_id: 200,
            },
        ];
        let gateway = FakeGateway {
            productions: Mutex::new(HashMap::new()),
            lines: HashMap::from([(77, lines)]),
            updates: Mutex::new(Vec::new()),
        };

        let links_1 = TaskLinks { work_order_id: Some(77), operation_line_id: Some(1), ..Default::default() };
        let links_2 = TaskLinks { work_order_id: Some(77), operation_line_id: Some(2), ..Default::default() };
        let tasks = vec![
            task(1, 10, dt(1, 8), 4.0, links_1),
            task(2, 20, dt(2, 8), 6.0, links_2),
        ];

        let report = propagate_operation_lines(&tasks, &gateway).await;
        assert_eq!(report.operations_recomputed, 2);
        assert_eq!(report.failures, 0);

        let updates = gateway.updates.lock();
        // line 1: starts at the task's own start, ends 4h later.
        assert_eq!(updates[0].1.start, dt(1, 8));
        assert_eq!(updates[0].1.end, dt(1, 12));
        // line 2: prev ends dt(1, 12); + 2h transition = dt(1, 14);
        // - (4h * 50%) overlap = dt(1, 12).
        assert_eq!(updates[1].1.start, dt(1, 12));
    }

    #[tokio::test]
    async fn work_order_with_no_matching_task_for_any_line_reports_nothing() {
        let lines = vec![OperationLine {
            id: 1,
            work_order_id: 77,
            sequence: 1,
            post_transition_hours: 0.0,
            overlap_pct: 0.0,
            remaining_work_hours: 4.0,
            workcenter_id: 100,
        }];
        let gateway = FakeGateway {
            productions: Mutex::new(HashMap::new()),
            lines: HashMap::from([(77, lines)]),
            updates: Mutex::new(Vec::new()),
        };
        let links = TaskLinks { work_order_id: Some(77), operation_line_id: Some(999), ..Default::default() };
        let tasks = vec![task(1, 10, dt(1, 8), 4.0, links)];

        let report = propagate_operation_lines(&tasks, &gateway).await;
        assert_eq!(report.operations_recomputed, 0);
        assert_eq!(report.failures, 0);
    }
}
