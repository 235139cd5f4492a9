//! Service initialization

use crate::state::AppState;
use anyhow::{Context, Result};
use melody_core::Config;
use melody_db::create_rate_limit_store;
use melody_infra::{OriginPolicy, RateLimiter, RecaptchaVerifier};
use melody_processing::{DownloadOrchestrator, DownloadPipelineConfig};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// Build the gates and the download pipeline from configuration.
///
/// `pool` is required when the PostgreSQL rate limit store is selected.
pub fn initialize_services(config: &Config, pool: Option<PgPool>) -> Result<Arc<AppState>> {
    let store = create_rate_limit_store(config.rate_limit_store(), pool)
        .context("Failed to create rate limit store")?;
    let rate_limiter = RateLimiter::new(store, config.download_limit());

    let verifier = RecaptchaVerifier::new(
        config.recaptcha_secret_key(),
        config.recaptcha_verify_url(),
        config.recaptcha_min_score(),
        Duration::from_secs(config.recaptcha_timeout_secs()),
    )?;

    let origin_policy = OriginPolicy::new(config.origin_mode(), config.origin_domain())
        .context("Failed to build origin allow-list from ORIGIN_DOMAIN")?;

    let pipeline = DownloadPipelineConfig::from_config(config)?;
    tracing::info!(
        extractor = %pipeline.extractor,
        transcoder = %pipeline.transcoder,
        mode = ?pipeline.mode,
        audio_format = %pipeline.audio_format,
        "Download pipeline configured"
    );

    Ok(Arc::new(AppState {
        config: config.clone(),
        rate_limiter,
        verifier: Arc::new(verifier),
        origin_policy,
        orchestrator: DownloadOrchestrator::new(pipeline),
    }))
}
