pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

#[cfg(test)]
mod tests;

pub use router::create_router;
pub use state::AppState;

use sqlx::postgres::PgPoolOptions;

/// Builds the database pool and state the binary entrypoint wires into
/// `create_router`. Split out so `integration-tests` can build the same
/// `AppState` against a test database without going through a process.
pub async fn connect(config: &shared::PlanningConfig) -> anyhow::Result<sqlx::PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(config.persistence_timeout())
        .connect(&config.database_url)
        .await
        .map_err(Into::into)
}
