use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::application::Application;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitApplicationPayload {
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    /// Storage URL of the uploaded resume; an empty value is rejected.
    #[validate(length(min = 1))]
    pub resume: String,
    pub resume_filename: Option<String>,
    pub cover_letter: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusPayload {
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationResponse {
    pub success: bool,
    pub message: String,
    pub data: Application,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteApplicationResponse {
    pub success: bool,
    pub message: String,
    pub deleted_id: Uuid,
    pub cloudinary_deleted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadResponse {
    pub success: bool,
    pub url: String,
    pub filename: String,
}

/// Application row joined with a summary of its posting, for the applicant's
/// dashboard. The job columns are nullable because the posting may already be
/// mid-cascade when the list is read.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationWithJob {
    pub id: Uuid,
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    pub name: String,
    pub email: String,
    pub resume_url: String,
    pub resume_filename: Option<String>,
    pub cover_letter: String,
    pub status: String,
    pub applied_at: DateTime<Utc>,
    pub job_title: Option<String>,
    pub job_company: Option<String>,
    pub job_location: Option<String>,
    pub job_salary: Option<Decimal>,
    pub job_logo_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationListQuery {
    pub applicant_id: Option<Uuid>,
}
