use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use melody_core::models::RateLimitRecord;
use melody_core::{AppError, ClientIdentifier, RateLimitBackend};
use sqlx::PgPool;
use tokio::sync::Mutex;

/// Storage for per-client download counters.
///
/// Implementations must make `increment` atomic per identifier: `n` concurrent calls
/// starting from count `c` leave the counter at `c + n`.
#[async_trait::async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Current record for `identifier`, `None` if it never completed a download.
    async fn get(&self, identifier: &ClientIdentifier)
        -> Result<Option<RateLimitRecord>, AppError>;

    /// Add one download, creating the record on first use. Returns the updated row.
    async fn increment(&self, identifier: &ClientIdentifier) -> Result<RateLimitRecord, AppError>;

    /// Cheap connectivity check used by readiness probes.
    async fn ping(&self) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct PgRateLimitStore {
    pool: PgPool,
}

impl PgRateLimitStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RateLimitStore for PgRateLimitStore {
    #[tracing::instrument(skip(self, identifier), fields(
        db.system = "postgresql",
        db.table = "download_rate_limits",
        db.operation = "select",
        client = %identifier
    ))]
    async fn get(
        &self,
        identifier: &ClientIdentifier,
    ) -> Result<Option<RateLimitRecord>, AppError> {
        sqlx::query_as::<_, RateLimitRecord>(
            r#"
            SELECT hashed_ip, download_count, last_reset
            FROM download_rate_limits
            WHERE hashed_ip = $1
            "#,
        )
        .bind(identifier.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, client = %identifier, "Failed to read rate limit record");
            AppError::Database(e)
        })
    }

    #[tracing::instrument(skip(self, identifier), fields(
        db.system = "postgresql",
        db.table = "download_rate_limits",
        db.operation = "upsert",
        client = %identifier
    ))]
    async fn increment(&self, identifier: &ClientIdentifier) -> Result<RateLimitRecord, AppError> {
        // Single statement so concurrent increments for one client never lose updates
        sqlx::query_as::<_, RateLimitRecord>(
            r#"
            INSERT INTO download_rate_limits (hashed_ip, download_count, last_reset)
            VALUES ($1, 1, NOW())
            ON CONFLICT (hashed_ip)
            DO UPDATE SET download_count = download_rate_limits.download_count + 1
            RETURNING hashed_ip, download_count, last_reset
            "#,
        )
        .bind(identifier.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, client = %identifier, "Failed to increment download count");
            AppError::Database(e)
        })
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(AppError::Database)
    }
}

/// Process-local counters for development and tests.
///
/// Counts are lost on restart and are not shared between instances.
#[derive(Default)]
pub struct InMemoryRateLimitStore {
    records: Mutex<HashMap<String, RateLimitRecord>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a counter, replacing any existing value.
    pub async fn set_count(&self, identifier: &ClientIdentifier, download_count: i32) {
        let mut records = self.records.lock().await;
        records.insert(
            identifier.as_str().to_string(),
            RateLimitRecord {
                hashed_ip: identifier.as_str().to_string(),
                download_count,
                last_reset: Utc::now(),
            },
        );
    }
}

#[async_trait::async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn get(
        &self,
        identifier: &ClientIdentifier,
    ) -> Result<Option<RateLimitRecord>, AppError> {
        let records = self.records.lock().await;
        Ok(records.get(identifier.as_str()).cloned())
    }

    async fn increment(&self, identifier: &ClientIdentifier) -> Result<RateLimitRecord, AppError> {
        let mut records = self.records.lock().await;
        let record = records
            .entry(identifier.as_str().to_string())
            .or_insert_with(|| RateLimitRecord {
                hashed_ip: identifier.as_str().to_string(),
                download_count: 0,
                last_reset: Utc::now(),
            });
        record.download_count += 1;
        Ok(record.clone())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Build the store selected by configuration.
///
/// The PostgreSQL backend needs a pool; asking for it without one is a setup error.
pub fn create_rate_limit_store(
    backend: RateLimitBackend,
    pool: Option<PgPool>,
) -> Result<Arc<dyn RateLimitStore>, AppError> {
    match (backend, pool) {
        (RateLimitBackend::Postgres, Some(pool)) => {
            tracing::info!("Using PostgreSQL rate limit store");
            Ok(Arc::new(PgRateLimitStore::new(pool)))
        }
        (RateLimitBackend::Postgres, None) => Err(AppError::Internal(
            "PostgreSQL rate limit store requires a database pool".to_string(),
        )),
        (RateLimitBackend::Memory, _) => {
            tracing::warn!("Using in-memory rate limit store; counts reset on restart");
            Ok(Arc::new(InMemoryRateLimitStore::new()))
        }
    }
}
