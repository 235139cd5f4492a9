//! Application state shared by all handlers.

use melody_core::Config;
use melody_infra::{HumanVerifier, OriginPolicy, RateLimiter};
use melody_processing::DownloadOrchestrator;
use std::sync::Arc;

/// Built once at startup and handed to the router as `Arc<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub rate_limiter: RateLimiter,
    pub verifier: Arc<dyn HumanVerifier>,
    pub origin_policy: OriginPolicy,
    pub orchestrator: DownloadOrchestrator,
}
