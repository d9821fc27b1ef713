use gateway::{connect, create_router, AppState};
use shared::PlanningConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shared::logger::init_logger();

    let config = PlanningConfig::from_env()?;
    let pool = connect(&config).await?;
    let state = AppState::new(pool, &config)?;

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
    tracing::info!(addr = %listener.local_addr()?, "planning gateway listening");

    axum::serve(listener, create_router(state)).await?;
    Ok(())
}
