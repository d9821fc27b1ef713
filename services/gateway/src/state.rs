//! Process-wide state: the loaded-planning cache plus the currently
//! selected planning a session's edit/read endpoints operate on.
//!
//! The reference's per-process "currently selected planning" singleton
//! is global mutable state a production rewrite should thread
//! explicitly instead. This keeps every loaded planning addressable by
//! id in `plannings` (so concurrent edits against distinct plannings
//! stay independent) while still exposing one "selected" pointer for
//! the session-shaped HTTP surface.

use std::sync::Arc;

use chrono_tz::Tz;
use coordinator::{CoordinatorConfig, EditCoordinator};
use dashmap::DashMap;
use parking_lot::RwLock;
use persistence::{PgPlanningLoader, PgRowPersister, PgWorkOrderGateway, RowColumn};
use shared::ids::PlanningId;
use shared::time::Locale;
use shared::PlanningConfig;
use sqlx::PgPool;
use store::TaskStore;

pub struct LoadedPlanning {
    pub store: Arc<RwLock<TaskStore>>,
    pub coordinator: Arc<EditCoordinator<PgRowPersister>>,
}

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub loader: Arc<PgPlanningLoader>,
    pub work_order_gateway: Arc<PgWorkOrderGateway>,
    pub plannings: Arc<DashMap<PlanningId, Arc<LoadedPlanning>>>,
    pub selected: Arc<RwLock<Option<PlanningId>>>,
    pub coordinator_config: CoordinatorConfig,
    pub display_timezone: Tz,
    pub locale: Locale,
}

impl AppState {
    pub fn new(pool: PgPool, config: &PlanningConfig) -> anyhow::Result<Self> {
        let display_timezone: Tz = config
            .display_timezone
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid PLANNING_DISPLAY_TIMEZONE: {}", config.display_timezone))?;

        Ok(Self {
            pool: pool.clone(),
            loader: Arc::new(PgPlanningLoader::new(pool.clone(), display_timezone, config.half_day_hours)),
            work_order_gateway: Arc::new(PgWorkOrderGateway::new(pool)),
            plannings: Arc::new(DashMap::new()),
            selected: Arc::new(RwLock::new(None)),
            coordinator_config: CoordinatorConfig {
                min_horizon_slots: config.min_horizon_slots,
                horizon_margin_slots: config.horizon_margin_slots,
                keyboard_chain_cap: config.keyboard_chain_cap,
                row_sweep_cap: config.row_sweep_cap,
            },
            locale: Locale::parse(&config.locale),
        })
    }

    /// Loads (or re-fetches) a planning and makes it the selected one.
    pub async fn select_planning(&self, planning_id: PlanningId) -> anyhow::Result<()> {
        let loaded = self.load(planning_id).await?;
        self.plannings.insert(planning_id, loaded);
        *self.selected.write() = Some(planning_id);
        Ok(())
    }

    pub async fn reload_selected(&self) -> anyhow::Result<()> {
        let planning_id = self.selected.read().ok_or_else(|| anyhow::anyhow!("no planning selected"))?;
        let loaded = self.load(planning_id).await?;
        self.plannings.insert(planning_id, loaded);
        Ok(())
    }

    async fn load(&self, planning_id: PlanningId) -> anyhow::Result<Arc<LoadedPlanning>> {
        let task_store = self.loader.load_planning(planning_id).await?;
        let display_type = task_store.display_type();
        let store = Arc::new(RwLock::new(task_store));
        let row_column = RowColumn::for_display_type(display_type);
        let persister = Arc::new(PgRowPersister::new(self.pool.clone(), row_column, self.display_timezone));
        let coordinator = Arc::new(EditCoordinator::new(planning_id, store.clone(), persister, self.coordinator_config));
        Ok(Arc::new(LoadedPlanning { store, coordinator }))
    }

    pub fn selected_planning(&self) -> Option<Arc<LoadedPlanning>> {
        let id = (*self.selected.read())?;
        self.plannings.get(&id).map(|entry| entry.value().clone())
    }
}
