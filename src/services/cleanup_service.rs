use sqlx::{PgPool, Row};
use tracing::{error, info, warn};

use crate::error::Result;
use crate::services::storage_service::StorageService;

const MAX_ATTEMPTS: i32 = 8;
const RETRY_BASE_SECS: i64 = 60;

/// Retries remote deletions that failed on the request path. Deletion intents
/// are queued durably, so a flaky storage gateway never blocks a local delete
/// and orphaned artifacts are reconciled here instead of leaking forever.
#[derive(Clone)]
pub struct CleanupService {
    pool: PgPool,
    storage: StorageService,
}

impl CleanupService {
    pub fn new(pool: PgPool, storage: StorageService) -> Self {
        Self { pool, storage }
    }

    pub async fn enqueue(pool: &PgPool, public_id: &str, resource_type: &str) {
        let res = sqlx::query(
            r#"
            INSERT INTO storage_cleanup_queue (public_id, resource_type)
            VALUES ($1, $2)
            "#,
        )
        .bind(public_id)
        .bind(resource_type)
        .execute(pool)
        .await;
        if let Err(e) = res {
            error!(public_id, error = ?e, "Failed to enqueue storage cleanup");
        }
    }

    /// Processes at most one due queue entry. Returns `Ok(true)` when an entry
    /// was handled so the worker loop can poll again immediately.
    pub async fn run_once(&self) -> Result<bool> {
        let Some(row) = sqlx::query(
            r#"
            SELECT id, public_id, resource_type, attempts
            FROM storage_cleanup_queue
            WHERE next_attempt_at <= NOW()
            ORDER BY next_attempt_at
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(false);
        };

        let id: i64 = row.try_get("id")?;
        let public_id: String = row.try_get("public_id")?;
        let resource_type: String = row.try_get("resource_type")?;
        let attempts: i32 = row.try_get("attempts")?;

        match self.storage.destroy(&public_id, &resource_type).await {
            Ok(true) => {
                info!(public_id, "Reconciled orphaned storage object");
                self.remove(id).await?;
            }
            Ok(false) if attempts + 1 >= MAX_ATTEMPTS => {
                warn!(public_id, attempts = attempts + 1, "Giving up on storage cleanup");
                self.remove(id).await?;
            }
            Ok(false) => {
                self.reschedule(id, attempts, "object not removed").await?;
            }
            Err(e) => {
                if attempts + 1 >= MAX_ATTEMPTS {
                    warn!(public_id, error = ?e, "Giving up on storage cleanup after repeated errors");
                    self.remove(id).await?;
                } else {
                    self.reschedule(id, attempts, &e.to_string()).await?;
                }
            }
        }
        Ok(true)
    }

    async fn remove(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM storage_cleanup_queue WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn reschedule(&self, id: i64, attempts: i32, last_error: &str) -> Result<()> {
        let delay_secs = RETRY_BASE_SECS * (attempts as i64 + 1);
        sqlx::query(
            r#"
            UPDATE storage_cleanup_queue
            SET attempts = attempts + 1,
                last_error = $2,
                next_attempt_at = NOW() + make_interval(secs => $3)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(last_error)
        .bind(delay_secs as f64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
