//! Postgres persistence adapter for the edit coordinator's `RowPersister`
//! port.

pub mod loader;
pub mod row_persister;
pub mod timezone;
pub mod work_order_gateway;

pub use loader::{PgPlanningLoader, PlanningSummary};
pub use row_persister::{PgRowPersister, RowColumn};
pub use timezone::{to_local_naive, to_storage_utc};
pub use work_order_gateway::PgWorkOrderGateway;
