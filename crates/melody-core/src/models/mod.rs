//! Domain models shared across Melody crates.

pub mod download;
pub mod rate_limit;
pub mod verification;

pub use download::DownloadRequest;
pub use rate_limit::RateLimitRecord;
pub use verification::VerificationResult;
