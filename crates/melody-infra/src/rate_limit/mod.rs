//! Per-client download quota

mod limiter;

pub use limiter::RateLimiter;
