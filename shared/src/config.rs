//! Process-wide configuration, loaded once at startup from the environment.
//!
//! Covers display timezone, half-day length, horizon parameters, cascade
//! caps, and the locale used for header labels.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningConfig {
    pub database_url: String,
    pub display_timezone: String,
    pub half_day_hours: f64,
    pub min_horizon_slots: u32,
    pub horizon_margin_slots: u32,
    pub keyboard_chain_cap: u32,
    pub row_sweep_cap: u32,
    pub locale: String,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/planning".to_string(),
            display_timezone: "Europe/Paris".to_string(),
            half_day_hours: 3.5,
            min_horizon_slots: 60,
            horizon_margin_slots: 14,
            keyboard_chain_cap: 20,
            row_sweep_cap: 50,
            locale: "fr".to_string(),
        }
    }
}

impl PlanningConfig {
    /// Loads configuration from environment variables prefixed `PLANNING_`,
    /// falling back to the documented defaults for anything unset.
    pub fn from_env() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&PlanningConfig::default())?)
            .add_source(
                config::Environment::with_prefix("PLANNING")
                    .try_parsing(true)
                    .separator("__"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn persistence_timeout(&self) -> Duration {
        Duration::from_secs(10)
    }
}
