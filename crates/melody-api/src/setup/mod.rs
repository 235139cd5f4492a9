//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod validation;

use crate::state::AppState;
use anyhow::{Context, Result};
use melody_core::{Config, RateLimitBackend};
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    validation::validate_config(&config).context("Configuration validation failed")?;

    melody_infra::init_telemetry(config.log_format())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        origin_mode = ?config.origin_mode(),
        "Configuration loaded and validated successfully"
    );

    let pool = match config.rate_limit_store() {
        RateLimitBackend::Postgres => Some(database::setup_database(&config).await?),
        RateLimitBackend::Memory => None,
    };

    let state = services::initialize_services(&config, pool)?;

    let router = routes::setup_routes(state.clone());

    Ok((state, router))
}
