use std::sync::Arc;

use melody_core::{AppError, ClientIdentifier};
use melody_db::RateLimitStore;

/// Download quota enforced per hashed client address.
///
/// Counts are only ever raised by [`RateLimiter::record_download`], which callers invoke
/// once per fully streamed download.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    max_downloads: i32,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, max_downloads: i32) -> Self {
        Self {
            store,
            max_downloads,
        }
    }

    pub fn max_downloads(&self) -> i32 {
        self.max_downloads
    }

    pub fn store(&self) -> &Arc<dyn RateLimitStore> {
        &self.store
    }

    /// Completed downloads for `identifier`; no record counts as zero.
    pub async fn download_count(&self, identifier: &ClientIdentifier) -> Result<i32, AppError> {
        let record = self.store.get(identifier).await?;
        Ok(record.map_or(0, |r| r.download_count))
    }

    /// `true` once the client has used up its quota.
    ///
    /// Store failures are returned as errors so the caller can refuse the request.
    pub async fn check_limit(&self, identifier: &ClientIdentifier) -> Result<bool, AppError> {
        let count = self.download_count(identifier).await?;
        let limited = count >= self.max_downloads;
        if limited {
            tracing::warn!(
                client = %identifier,
                count,
                limit = self.max_downloads,
                "Download limit reached"
            );
        }
        Ok(limited)
    }

    /// Count one completed download. Returns the new total.
    pub async fn record_download(&self, identifier: &ClientIdentifier) -> Result<i32, AppError> {
        let record = self.store.increment(identifier).await?;
        tracing::debug!(client = %identifier, count = record.download_count, "Download recorded");
        Ok(record.download_count)
    }
}
