use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of `download_rate_limits`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RateLimitRecord {
    /// SHA-256 hex of the caller address, see [`crate::ClientIdentifier`]
    pub hashed_ip: String,
    pub download_count: i32,
    pub last_reset: DateTime<Utc>,
}
