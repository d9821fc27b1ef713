//! Loads a planning's rows/tasks/affairs/closures out of the upstream
//! PostgreSQL schema. The loader itself is treated as an external
//! collaborator: the core crates only depend on the `TaskStore` shape
//! it produces, never on these queries directly.
//!
//! Table names and the `type_donnees` discriminant are grounded directly
//! on the reference's `load_tasks_from_db` / `load_operators_from_db` /
//! `load_affaires_from_db` / `load_fermetures_from_db`
//! (`flask-htmx/gestionnaire-de-taches/app.py`).

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use shared::ids::{AffairId, PlanningId, RowId, RowKind, TaskId};
use sqlx::{PgPool, Row as _};
use store::{Affair, Closure, PlanningMeta, Row as PlanningRow, Task, TaskLinks, TaskStore};

use crate::timezone::to_local_naive;

#[derive(Debug, Clone, serde::Serialize)]
pub struct PlanningSummary {
    pub id: PlanningId,
    pub name: String,
    pub task_count: i64,
    pub affair_count: i64,
}

pub struct PgPlanningLoader {
    pool: PgPool,
    display_timezone: Tz,
    half_day_hours: f64,
}

impl PgPlanningLoader {
    pub fn new(pool: PgPool, display_timezone: Tz, half_day_hours: f64) -> Self {
        Self { pool, display_timezone, half_day_hours }
    }

    pub async fn list_plannings(&self) -> anyhow::Result<Vec<PlanningSummary>> {
        let rows = sqlx::query(
            "SELECT p.id, p.name,
                    COUNT(DISTINCT t.id) AS task_count,
                    COUNT(DISTINCT a.id) AS affair_count
             FROM is_gestion_tache_planning p
             LEFT JOIN is_gestion_tache t ON t.planning_id = p.id
             LEFT JOIN is_gestion_tache_affaire a ON a.planning_id = p.id
             WHERE p.active = true
             GROUP BY p.id, p.name
             ORDER BY p.name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| PlanningSummary {
                id: PlanningId::new(row.get("id")),
                name: row.get("name"),
                task_count: row.get("task_count"),
                affair_count: row.get("affair_count"),
            })
            .collect())
    }

    pub async fn load_planning(&self, planning_id: PlanningId) -> anyhow::Result<TaskStore> {
        let header = sqlx::query(
            "SELECT name, type_donnees, date_fin_planning FROM is_gestion_tache_planning WHERE id = $1",
        )
        .bind(planning_id.get())
        .fetch_one(&self.pool)
        .await?;

        let name: String = header.get("name");
        let type_donnees: String = header.get("type_donnees");
        let end_date: Option<NaiveDate> = header.try_get("date_fin_planning").ok();
        let display_type = match type_donnees.as_str() {
            "of" => RowKind::Workcenter,
            _ => RowKind::Operator,
        };

        let rows = self.load_rows(planning_id, display_type).await?;
        let affairs = self.load_affairs(planning_id).await?;
        let closures = self.load_closures(planning_id).await?;
        let tasks = self.load_tasks(planning_id, display_type).await?;

        let planning_start_date = Utc::now().with_timezone(&self.display_timezone).date_naive();
        let calendar = calendar::Calendar::new(planning_start_date, self.half_day_hours);

        Ok(TaskStore::new(
            PlanningMeta {
                id: planning_id,
                name,
                display_type,
                calendar,
                end_date,
                filter: None,
                ready: true,
            },
            rows,
            tasks,
            affairs,
            closures,
        ))
    }

    async fn load_rows(&self, planning_id: PlanningId, display_type: RowKind) -> anyhow::Result<Vec<PlanningRow>> {
        let query = match display_type {
            RowKind::Operator => {
                "SELECT op.operator_id AS row_id, he.name
                 FROM is_gestion_tache_operateur op JOIN hr_employee he ON op.operator_id = he.id
                 WHERE op.planning_id = $1
                 ORDER BY he.name"
            }
            RowKind::Workcenter => {
                "SELECT w.workcenter_id AS row_id, mw.name
                 FROM is_gestion_tache_workcenter w JOIN mrp_workcenter mw ON w.workcenter_id = mw.id
                 WHERE w.planning_id = $1
                 ORDER BY mw.name"
            }
        };
        let rows = sqlx::query(query).bind(planning_id.get()).fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(|row| PlanningRow { id: RowId::new(row.get("row_id")), name: row.get("name") })
            .collect())
    }

    async fn load_affairs(&self, planning_id: PlanningId) -> anyhow::Result<Vec<Affair>> {
        let rows = sqlx::query(
            "SELECT id, name, color FROM is_gestion_tache_affaire WHERE planning_id = $1 ORDER BY name",
        )
        .bind(planning_id.get())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(|row| {
                Affair::new(
                    AffairId::new(row.get("id")),
                    row.get::<String, _>("name"),
                    row.get::<Option<String>, _>("color"),
                )
            })
            .collect())
    }

    async fn load_closures(&self, planning_id: PlanningId) -> anyhow::Result<Vec<Closure>> {
        let rows = sqlx::query(
            "SELECT date_fermeture, operator_id FROM is_gestion_tache_fermeture WHERE planning_id = $1",
        )
        .bind(planning_id.get())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(|row| Closure {
                date: row.get("date_fermeture"),
                row_id: row.try_get::<i64, _>("operator_id").ok().map(RowId::new),
            })
            .collect())
    }

    async fn load_tasks(&self, planning_id: PlanningId, display_type: RowKind) -> anyhow::Result<Vec<Task>> {
        let query = match display_type {
            RowKind::Operator => {
                "SELECT t.id, t.name, t.operator_id AS row_id, t.affaire_id, t.start_date, t.duration_hours,
                        t.operation_id, t.production_id, t.product_qty, t.is_derniere_date_prevue
                 FROM is_gestion_tache t
                 WHERE t.planning_id = $1
                 ORDER BY t.start_date, t.operator_id"
            }
            RowKind::Workcenter => {
                "SELECT t.id, t.name, t.workcenter_id AS row_id, t.affaire_id, t.start_date, t.duration_hours,
                        t.operation_id, t.production_id, t.product_qty, t.is_derniere_date_prevue
                 FROM is_gestion_tache t
                 WHERE t.planning_id = $1
                 ORDER BY t.start_date, t.workcenter_id"
            }
        };
        let rows = sqlx::query(query).bind(planning_id.get()).fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(|row| {
                let start_utc: chrono::DateTime<Utc> = row.get("start_date");
                Task {
                    id: TaskId::new(row.get("id")),
                    row_id: RowId::new(row.get("row_id")),
                    affair_id: row.try_get::<i64, _>("affaire_id").ok().map(AffairId::new),
                    name: row.get("name"),
                    start: to_local_naive(start_utc, self.display_timezone),
                    duration_hours: row.get("duration_hours"),
                    links: TaskLinks {
                        order_id: None,
                        production_id: row.try_get("production_id").ok(),
                        work_order_id: None,
                        operation_line_id: row.try_get("operation_id").ok(),
                        remaining_quantity: row.try_get("product_qty").ok(),
                        last_required_date: row.try_get("is_derniere_date_prevue").ok(),
                    },
                }
            })
            .collect())
    }
}
