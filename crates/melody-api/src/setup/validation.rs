//! Configuration validation
//!
//! Hard errors come from `Config::validate`; this adds warnings for settings that
//! are legal but probably not intended.

use anyhow::Result;
use melody_core::{Config, OriginMode, RateLimitBackend};

pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    if config.is_production() {
        if config.origin_mode() == OriginMode::Development {
            tracing::warn!("MODE selects development origins in a production environment");
        }
        if config.rate_limit_store() == RateLimitBackend::Memory {
            tracing::warn!("In-memory rate limit store in production; counts reset on restart");
        }
    }

    if config.trusted_proxy_count() > 10 {
        tracing::warn!(
            trusted_proxy_count = config.trusted_proxy_count(),
            "TRUSTED_PROXY_COUNT is very high - ensure this matches your actual proxy setup"
        );
    }

    Ok(())
}
