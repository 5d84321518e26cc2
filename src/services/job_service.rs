use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::job::Job;
use crate::services::cleanup_service::CleanupService;
use crate::services::storage_service::{StorageService, RESOURCE_RAW};
use crate::utils::locator::public_id_from_url;

const JOB_COLUMNS: &str = "id, title, company, description, location, salary, employer_id, \
     logo_url, tags, created_at, deadline, deleting_at";

/// Validated field set for job creation; assembled by the route from the
/// multipart form after the logo upload (if any) has succeeded.
pub struct NewJob {
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: String,
    pub salary: Decimal,
    pub employer_id: Uuid,
    pub logo_url: Option<String>,
    pub tags: Vec<String>,
    pub deadline: DateTime<Utc>,
}

pub struct UpdatedJobFields {
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: String,
    pub salary: Decimal,
    pub tags: Vec<String>,
    pub deadline: Option<DateTime<Utc>>,
}

pub struct CascadeOutcome {
    pub deleted_applications: i64,
    pub deleted_resumes: i64,
}

#[derive(Clone)]
pub struct JobService {
    pool: PgPool,
    storage: StorageService,
}

impl JobService {
    pub fn new(pool: PgPool, storage: StorageService) -> Self {
        Self { pool, storage }
    }

    pub async fn create(&self, job: NewJob) -> Result<Job> {
        let created = sqlx::query_as::<_, Job>(&format!(
            r#"
            INSERT INTO jobs
                (title, company, description, location, salary, employer_id,
                 logo_url, tags, deadline)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(&job.title)
        .bind(&job.company)
        .bind(&job.description)
        .bind(&job.location)
        .bind(job.salary)
        .bind(job.employer_id)
        .bind(&job.logo_url)
        .bind(&job.tags)
        .bind(job.deadline)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Job> {
        let job = sqlx::query_as::<_, Job>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Job not found".to_string()))?;
        Ok(job)
    }

    /// Full-field update. The deadline is re-parsed but its futurity is not
    /// re-checked here; only the create path enforces a future deadline.
    pub async fn update(&self, id: Uuid, fields: UpdatedJobFields) -> Result<Job> {
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET title = $2,
                company = $3,
                description = $4,
                location = $5,
                salary = $6,
                tags = $7,
                deadline = COALESCE($8, deadline)
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&fields.title)
        .bind(&fields.company)
        .bind(&fields.description)
        .bind(&fields.location)
        .bind(fields.salary)
        .bind(&fields.tags)
        .bind(fields.deadline)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Job not found".to_string()))?;
        Ok(job)
    }

    pub async fn list_by_employer(&self, employer_id: Uuid) -> Result<Vec<Job>> {
        let jobs = sqlx::query_as::<_, Job>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE employer_id = $1 ORDER BY deadline ASC"
        ))
        .bind(employer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    pub async fn list_all(&self) -> Result<Vec<Job>> {
        let jobs = sqlx::query_as::<_, Job>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    /// Deletes a job and everything hanging off it. The cascade is not
    /// transactional: the job is first marked with `deleting_at`, then the
    /// dependent applications are purged one by one, then the job row is
    /// removed. A crash mid-cascade leaves the mark in place and re-running
    /// the delete resumes the purge. Remote resume deletions are best-effort
    /// and counted; failures go on the cleanup queue.
    pub async fn delete_cascade(&self, job: &Job) -> Result<CascadeOutcome> {
        sqlx::query("UPDATE jobs SET deleting_at = NOW() WHERE id = $1 AND deleting_at IS NULL")
            .bind(job.id)
            .execute(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, (Uuid, String, Option<String>)>(
            "SELECT id, resume_url, resume_public_id FROM applications WHERE job_id = $1",
        )
        .bind(job.id)
        .fetch_all(&self.pool)
        .await?;

        let mut deleted_applications = 0i64;
        let mut deleted_resumes = 0i64;

        for (app_id, resume_url, resume_public_id) in rows {
            let public_id = resume_public_id.or_else(|| public_id_from_url(&resume_url));
            if let Some(public_id) = public_id {
                match self.storage.destroy(&public_id, RESOURCE_RAW).await {
                    Ok(true) => deleted_resumes += 1,
                    Ok(false) => {
                        CleanupService::enqueue(&self.pool, &public_id, RESOURCE_RAW).await;
                    }
                    Err(e) => {
                        warn!(application_id = %app_id, error = ?e, "Resume deletion failed during cascade");
                        CleanupService::enqueue(&self.pool, &public_id, RESOURCE_RAW).await;
                    }
                }
            }

            sqlx::query("DELETE FROM applications WHERE id = $1")
                .bind(app_id)
                .execute(&self.pool)
                .await?;
            deleted_applications += 1;
        }

        let res = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(job.id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            // dependents are already gone at this point; surfaced as a hard
            // failure so the caller knows the cascade did not finish cleanly
            return Err(Error::Internal("Failed to delete job record".to_string()));
        }

        info!(job_id = %job.id, deleted_applications, deleted_resumes, "Cascaded job deletion");
        Ok(CascadeOutcome {
            deleted_applications,
            deleted_resumes,
        })
    }
}
