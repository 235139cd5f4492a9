//! Melody Infrastructure Library
//!
//! This crate provides the shared infrastructure the download service is built on:
//! - Middleware (request ID)
//! - Telemetry initialization
//! - Error response format
//! - Origin allow-listing
//! - Human verification
//! - Download rate limiting

#[cfg(feature = "middleware")]
pub mod middleware;

#[cfg(feature = "observability-basic")]
pub mod telemetry;

pub mod error;
pub mod origin;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

#[cfg(feature = "verification")]
pub mod verification;

// Re-export commonly used types
#[cfg(feature = "middleware")]
pub use middleware::{get_request_id, request_id_middleware, RequestId};

#[cfg(feature = "observability-basic")]
pub use telemetry::init_telemetry;

pub use error::ErrorResponse;
pub use origin::{is_allowed_origin, OriginPolicy};

#[cfg(feature = "rate-limit")]
pub use rate_limit::RateLimiter;

#[cfg(feature = "verification")]
pub use verification::{HumanVerifier, RecaptchaVerifier, VerificationError};
