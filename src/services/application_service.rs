use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::dto::application_dto::{ApplicationWithJob, SubmitApplicationPayload};
use crate::error::{Error, Result};
use crate::models::application::{Application, ApplicationStatus};
use crate::services::cleanup_service::CleanupService;
use crate::services::storage_service::{StorageService, RESOURCE_RAW};
use crate::utils::locator::public_id_from_url;

const APPLICATION_COLUMNS: &str = "id, job_id, applicant_id, name, email, resume_url, \
     resume_filename, cover_letter, status, applied_at, resume_public_id";

#[derive(Clone)]
pub struct ApplicationService {
    pool: PgPool,
    storage: StorageService,
}

impl ApplicationService {
    pub fn new(pool: PgPool, storage: StorageService) -> Self {
        Self { pool, storage }
    }

    /// Creates a new application in `pending` state. The duplicate check is
    /// read-then-write, but the compound unique index on (job_id,
    /// applicant_id) closes the race: a concurrent second insert surfaces as
    /// a unique violation, which maps to `Conflict` as well.
    pub async fn submit(&self, payload: SubmitApplicationPayload) -> Result<Application> {
        let job_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM jobs WHERE id = $1)")
                .bind(payload.job_id)
                .fetch_one(&self.pool)
                .await?;
        if !job_exists {
            return Err(Error::NotFound("Job not found".to_string()));
        }

        let user_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
                .bind(payload.applicant_id)
                .fetch_one(&self.pool)
                .await?;
        if !user_exists {
            return Err(Error::NotFound("User not found".to_string()));
        }

        let existing = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM applications WHERE job_id = $1 AND applicant_id = $2",
        )
        .bind(payload.job_id)
        .bind(payload.applicant_id)
        .fetch_optional(&self.pool)
        .await?;
        if existing.is_some() {
            return Err(Error::Conflict(
                "You have already applied to this job".to_string(),
            ));
        }

        let resume_public_id = public_id_from_url(&payload.resume);

        let application = sqlx::query_as::<_, Application>(&format!(
            r#"
            INSERT INTO applications
                (job_id, applicant_id, name, email, resume_url, resume_filename,
                 cover_letter, status, resume_public_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8)
            RETURNING {APPLICATION_COLUMNS}
            "#
        ))
        .bind(payload.job_id)
        .bind(payload.applicant_id)
        .bind(&payload.name)
        .bind(&payload.email)
        .bind(&payload.resume)
        .bind(&payload.resume_filename)
        .bind(payload.cover_letter.unwrap_or_default())
        .bind(&resume_public_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(application)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Application> {
        let application = sqlx::query_as::<_, Application>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Application not found".to_string()))?;
        Ok(application)
    }

    pub async fn list_by_applicant(&self, applicant_id: Uuid) -> Result<Vec<ApplicationWithJob>> {
        let rows = sqlx::query_as::<_, ApplicationWithJob>(
            r#"
            SELECT a.id, a.job_id, a.applicant_id, a.name, a.email, a.resume_url,
                   a.resume_filename, a.cover_letter, a.status, a.applied_at,
                   j.title AS job_title, j.company AS job_company,
                   j.location AS job_location, j.salary AS job_salary,
                   j.logo_url AS job_logo_url
            FROM applications a
            LEFT JOIN jobs j ON j.id = a.job_id
            WHERE a.applicant_id = $1
            ORDER BY a.applied_at DESC
            "#,
        )
        .bind(applicant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_by_job(&self, job_id: Uuid) -> Result<Vec<Application>> {
        let rows = sqlx::query_as::<_, Application>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE job_id = $1 ORDER BY applied_at DESC"
        ))
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_all(&self) -> Result<Vec<Application>> {
        let rows = sqlx::query_as::<_, Application>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications ORDER BY applied_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Persists a status transition. Any of the four values is accepted from
    /// any current state; there is no transition table and no terminal state.
    pub async fn update_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Application> {
        let application = sqlx::query_as::<_, Application>(&format!(
            "UPDATE applications SET status = $2 WHERE id = $1 RETURNING {APPLICATION_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Application not found".to_string()))?;
        Ok(application)
    }

    /// Deletes an application record. The stored resume is removed from the
    /// storage gateway on a best-effort basis: a failed remote delete is
    /// logged and queued for the reconciler, and the database record is
    /// removed regardless. Returns whether the remote artifact was actually
    /// removed.
    pub async fn delete(&self, application: &Application) -> Result<bool> {
        let public_id = application
            .resume_public_id
            .clone()
            .or_else(|| public_id_from_url(&application.resume_url));

        let mut remote_deleted = false;
        if let Some(public_id) = public_id {
            match self.storage.destroy(&public_id, RESOURCE_RAW).await {
                Ok(true) => remote_deleted = true,
                Ok(false) => {
                    CleanupService::enqueue(&self.pool, &public_id, RESOURCE_RAW).await;
                }
                Err(e) => {
                    warn!(application_id = %application.id, error = ?e, "Resume deletion failed, queuing for retry");
                    CleanupService::enqueue(&self.pool, &public_id, RESOURCE_RAW).await;
                }
            }
        }

        sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(application.id)
            .execute(&self.pool)
            .await?;

        Ok(remote_deleted)
    }
}
