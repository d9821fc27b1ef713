pub mod model;
pub mod task_store;

pub use model::{Affair, Closure, PlanningMeta, Row, Task, TaskLinks};
pub use task_store::{StoreError, TaskStore};
