//! Origin allow-listing
//!
//! Browsers send an `Origin` header on cross-site requests. Only the front-end hosts
//! for the current mode may trigger downloads; the same policy backs the CORS layer
//! and the check inside the download handler.

use std::sync::LazyLock;

use melody_core::constants::DEFAULT_ORIGIN_DOMAIN;
use melody_core::OriginMode;
use regex::Regex;

/// Loopback and `192.168.x.y` hosts, scheme and port optional.
const DEVELOPMENT_PATTERN: &str =
    r"^(?:https?://)?(?:localhost|127\.0\.0\.1|192\.168\.\d{1,3}\.\d{1,3})(?::\d{1,5})?$";

static DEFAULT_POLICIES: LazyLock<Result<(OriginPolicy, OriginPolicy), regex::Error>> =
    LazyLock::new(|| {
        Ok((
            OriginPolicy::new(OriginMode::Development, DEFAULT_ORIGIN_DOMAIN)?,
            OriginPolicy::new(OriginMode::Production, DEFAULT_ORIGIN_DOMAIN)?,
        ))
    });

/// Precompiled origin matcher for one mode.
#[derive(Clone, Debug)]
pub struct OriginPolicy {
    mode: OriginMode,
    pattern: Regex,
}

impl OriginPolicy {
    /// `domain` is only used in production mode, where it and its subdomains are allowed.
    pub fn new(mode: OriginMode, domain: &str) -> Result<Self, regex::Error> {
        let pattern = match mode {
            OriginMode::Development => Regex::new(DEVELOPMENT_PATTERN)?,
            OriginMode::Production => Regex::new(&production_pattern(domain))?,
        };
        Ok(Self { mode, pattern })
    }

    pub fn mode(&self) -> OriginMode {
        self.mode
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        let allowed = !origin.is_empty() && self.pattern.is_match(origin);
        tracing::debug!(origin, allowed, mode = ?self.mode, "Origin check");
        allowed
    }
}

/// The registered domain or any subdomain, or any host with an explicit port.
fn production_pattern(domain: &str) -> String {
    format!(
        r"^https?://(?:(?:[\w-]+\.)*{}|[\w.-]+:\d{{1,5}})$",
        regex::escape(domain)
    )
}

/// Check `origin` against the default policy for `mode`.
pub fn is_allowed_origin(origin: &str, mode: OriginMode) -> bool {
    match DEFAULT_POLICIES.as_ref() {
        Ok((development, production)) => match mode {
            OriginMode::Development => development.is_allowed(origin),
            OriginMode::Production => production.is_allowed(origin),
        },
        Err(e) => {
            tracing::error!(error = %e, "Origin patterns failed to compile");
            false
        }
    }
}
