//! Postgres-backed `WorkOrderGateway`.
//!
//! The reference only carries `is_ordre_travail_line.name` through its
//! read-only join (`app.py` line ~217); it has no exposed routing/transition
//! schema to crib from, so the column names below (`sequence`,
//! `post_transition_hours`, `overlap_pct`, `remaining_work_hours`,
//! `workcenter_id`) are this adapter's own, sized to exactly what
//! `propagator::WorkOrderGateway` needs.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use propagator::{LineUpdate, OperationLine, ProductionRecord, WorkOrderGateway};
use sqlx::{PgPool, Row as _};

pub struct PgWorkOrderGateway {
    pool: PgPool,
}

impl PgWorkOrderGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkOrderGateway for PgWorkOrderGateway {
    async fn production_for(&self, production_id: i64) -> anyhow::Result<Option<ProductionRecord>> {
        let row = sqlx::query("SELECT id, date_planned_start FROM mrp_production WHERE id = $1")
            .bind(production_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| ProductionRecord {
            id: row.get("id"),
            planned_start: row.get("date_planned_start"),
        }))
    }

    async fn set_production_start(&self, production_id: i64, start: NaiveDateTime) -> anyhow::Result<()> {
        sqlx::query("UPDATE mrp_production SET date_planned_start = $1 WHERE id = $2")
            .bind(start)
            .bind(production_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_production_primary_workcenter(
        &self,
        production_id: i64,
        workcenter_id: i64,
        duration_hours: f64,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE mrp_production SET is_workcenter_id = $1, is_duration_hours = $2 WHERE id = $3",
        )
        .bind(workcenter_id)
        .bind(duration_hours)
        .bind(production_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn operation_lines(&self, work_order_id: i64) -> anyhow::Result<Vec<OperationLine>> {
        let rows = sqlx::query(
            "SELECT id, work_order_id, sequence, post_transition_hours, overlap_pct,
                    remaining_work_hours, workcenter_id
             FROM is_ordre_travail_line
             WHERE work_order_id = $1",
        )
        .bind(work_order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(|row| OperationLine {
                id: row.get("id"),
                work_order_id: row.get("work_order_id"),
                sequence: row.get("sequence"),
                post_transition_hours: row.get("post_transition_hours"),
                overlap_pct: row.get("overlap_pct"),
                remaining_work_hours: row.get("remaining_work_hours"),
                workcenter_id: row.get("workcenter_id"),
            })
            .collect())
    }

    async fn earliest_end(
        &self,
        workcenter_id: i64,
        duration_hours: f64,
        start: NaiveDateTime,
    ) -> anyhow::Result<NaiveDateTime> {
        let row = sqlx::query("SELECT earliest_end($1, $2, $3) AS end_at")
            .bind(workcenter_id)
            .bind(duration_hours)
            .bind(start)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("end_at"))
    }

    async fn apply_line_update(&self, line_id: i64, update: LineUpdate) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE is_ordre_travail_line
             SET start = $1, \"end\" = $2, unit_duration = $3, employee_id = $4
             WHERE id = $5",
        )
        .bind(update.start)
        .bind(update.end)
        .bind(update.unit_duration_hours)
        .bind(update.employee_id)
        .bind(line_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
