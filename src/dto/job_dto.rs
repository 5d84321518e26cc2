use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

use crate::models::job::Job;

/// JSON body for the posting update endpoint. Tags may arrive as an array or
/// a comma-separated string and salary as a number or numeric string, so both
/// are taken as raw JSON values and coerced in the handler.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobPayload {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub company: String,
    #[validate(length(min = 1))]
    pub description: String,
    pub location: Option<String>,
    pub salary: Option<JsonValue>,
    pub tags: Option<JsonValue>,
    pub deadline: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: Decimal,
    pub description: String,
    pub employer: Uuid,
    pub logo: Option<String>,
    pub tags: Vec<String>,
    pub deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            title: job.title,
            company: job.company,
            location: job.location,
            salary: job.salary,
            description: job.description,
            employer: job.employer_id,
            logo: job.logo_url,
            tags: job.tags,
            deadline: job.deadline,
            created_at: job.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobEnvelope {
    pub success: bool,
    pub message: String,
    pub job: JobResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobDataEnvelope {
    pub success: bool,
    pub data: JobResponse,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListResponse {
    pub success: bool,
    pub all_jobs: Vec<JobResponse>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteJobResponse {
    pub success: bool,
    pub message: String,
    pub deleted_job_id: Uuid,
    pub deleted_applications: i64,
    pub deleted_resumes: i64,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct JobListQuery {
    pub employer_id: Option<Uuid>,
}
