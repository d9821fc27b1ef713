//! Postgres-backed `RowPersister`.
//!
//! Follows the same shape as an `OrderRepository` (`services/orders/src/repository.rs`):
//! raw `sqlx::query` calls bound by position, run against a shared `PgPool`.
//! Unlike the repository there, this adapter has no read-through cache —
//! the coordinator's in-memory `TaskStore` already is that cache, and a
//! second one here would just be another place for the two to disagree.

use async_trait::async_trait;
use chrono_tz::Tz;
use coordinator::RowPersister;
use shared::ids::{PlanningId, RowId, RowKind, TaskId};
use sqlx::PgPool;
use store::Task;

use crate::timezone::to_storage_utc;

/// Which column on `is_gestion_tache` carries the row assignment, mirroring
/// the planning's `display_type`.
#[derive(Debug, Clone, Copy)]
pub enum RowColumn {
    OperatorId,
    WorkcenterId,
}

impl RowColumn {
    pub fn for_display_type(kind: RowKind) -> Self {
        match kind {
            RowKind::Operator => RowColumn::OperatorId,
            RowKind::Workcenter => RowColumn::WorkcenterId,
        }
    }

    fn column_name(&self) -> &'static str {
        match self {
            RowColumn::OperatorId => "operator_id",
            RowColumn::WorkcenterId => "workcenter_id",
        }
    }
}

pub struct PgRowPersister {
    pool: PgPool,
    row_column: RowColumn,
    display_timezone: Tz,
}

impl PgRowPersister {
    pub fn new(pool: PgPool, row_column: RowColumn, display_timezone: Tz) -> Self {
        Self {
            pool,
            row_column,
            display_timezone,
        }
    }
}

#[async_trait]
impl RowPersister for PgRowPersister {
    /// Commits every task currently on `row` in a single transaction, so a
    /// failure partway through leaves the database exactly as it was:
    /// `sqlx`'s transaction drops uncommitted on error.
    async fn persist_row(
        &self,
        _planning: PlanningId,
        row: RowId,
        tasks: &[Task],
    ) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        let query = format!(
            "UPDATE is_gestion_tache SET start_date = $1, duration_hours = $2, {col} = $3 WHERE id = $4",
            col = self.row_column.column_name(),
        );
        for task in tasks {
            let utc_start = to_storage_utc(task.start, self.display_timezone);
            sqlx::query(&query)
                .bind(utc_start)
                .bind(task.duration_hours)
                .bind(row.get())
                .bind(task_id_param(task.id))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

fn task_id_param(id: TaskId) -> i64 {
    id.get()
}
