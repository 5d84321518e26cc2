use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::job_dto::{
        DeleteJobResponse, JobDataEnvelope, JobEnvelope, JobListQuery, JobListResponse,
        JobResponse, UpdateJobPayload,
    },
    error::{Error, Result},
    middleware::auth::Claims,
    models::user::ROLE_EMPLOYER,
    services::job_service::{NewJob, UpdatedJobFields},
    services::storage_service::RESOURCE_IMAGE,
    utils::normalize::{coerce_salary, parse_deadline, tags_from_str, tags_from_value},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/jobs",
    responses(
        (status = 201, description = "Job created"),
        (status = 400, description = "Missing or invalid fields"),
        (status = 403, description = "Bearer is not the employer")
    )
)]
#[axum::debug_handler]
pub async fn create_job(
    State(state): State<AppState>,
    claims: Claims,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut title = String::new();
    let mut company = String::new();
    let mut description = String::new();
    let mut location = String::new();
    let mut salary_raw = String::new();
    let mut employer_raw = String::new();
    let mut deadline_raw = String::new();
    let mut tags = Vec::new();
    let mut logo: Option<(String, bytes::Bytes)> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "title" => title = field.text().await.unwrap_or_default(),
            "company" => company = field.text().await.unwrap_or_default(),
            "description" => description = field.text().await.unwrap_or_default(),
            "location" => location = field.text().await.unwrap_or_default(),
            "salary" => salary_raw = field.text().await.unwrap_or_default(),
            "employer" => employer_raw = field.text().await.unwrap_or_default(),
            "deadline" => deadline_raw = field.text().await.unwrap_or_default(),
            "tags" => {
                let raw = field.text().await.unwrap_or_default();
                tags = tags_from_str(&raw);
            }
            "logo" => {
                let filename = field.file_name().unwrap_or("logo.png").to_string();
                let data = field.bytes().await?;
                if !data.is_empty() {
                    logo = Some((filename, data));
                }
            }
            _ => {}
        }
    }

    let employer_id = Uuid::parse_str(employer_raw.trim())
        .map_err(|_| Error::BadRequest("Valid employer ID is required".to_string()))?;
    claims.require_owner(employer_id)?;
    claims.require_role(ROLE_EMPLOYER)?;

    if title.is_empty() || company.is_empty() || description.is_empty() {
        return Err(Error::BadRequest("Missing required fields".to_string()));
    }
    if deadline_raw.is_empty() {
        return Err(Error::BadRequest("Deadline is required".to_string()));
    }
    let deadline = parse_deadline(&deadline_raw)
        .ok_or_else(|| Error::BadRequest("Invalid deadline format".to_string()))?;
    if deadline <= chrono::Utc::now() {
        return Err(Error::BadRequest(
            "Deadline must be in the future".to_string(),
        ));
    }

    let salary = Decimal::from_str(salary_raw.trim()).unwrap_or(Decimal::ZERO);
    if salary < Decimal::ZERO {
        return Err(Error::BadRequest("Salary must be non-negative".to_string()));
    }

    // upload before insert: a failed upload rejects the whole request, so a
    // posting never exists with a half-uploaded logo
    let mut logo_url = None;
    if let Some((filename, data)) = logo {
        let stored = state
            .storage
            .upload(data, &filename, RESOURCE_IMAGE)
            .await?;
        logo_url = Some(stored.secure_url);
    }

    let job = state
        .job_service
        .create(NewJob {
            title,
            company,
            description,
            location,
            salary,
            employer_id,
            logo_url,
            tags,
            deadline,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(JobEnvelope {
            success: true,
            message: "Job created successfully".to_string(),
            job: JobResponse::from(job),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    params(("id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job found"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let job = state.job_service.get_by_id(id).await?;
    Ok(Json(JobDataEnvelope {
        success: true,
        data: JobResponse::from(job),
    }))
}

#[utoipa::path(
    put,
    path = "/api/jobs/{id}",
    params(("id" = Uuid, Path, description = "Job ID")),
    request_body = UpdateJobPayload,
    responses(
        (status = 200, description = "Job updated"),
        (status = 403, description = "Bearer does not own the job"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn update_job(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateJobPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let job = state.job_service.get_by_id(id).await?;
    claims.require_owner(job.employer_id)?;

    let salary = coerce_salary(payload.salary.as_ref());
    if salary < Decimal::ZERO {
        return Err(Error::BadRequest("Salary must be non-negative".to_string()));
    }
    // deadline futurity is deliberately not re-checked on update
    let deadline = payload.deadline.as_deref().and_then(parse_deadline);

    let updated = state
        .job_service
        .update(
            id,
            UpdatedJobFields {
                title: payload.title,
                company: payload.company,
                description: payload.description,
                location: payload.location.unwrap_or_default(),
                salary,
                tags: tags_from_value(payload.tags.as_ref()),
                deadline,
            },
        )
        .await?;

    Ok(Json(JobDataEnvelope {
        success: true,
        data: JobResponse::from(updated),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/jobs/{id}",
    params(("id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job and dependents deleted"),
        (status = 403, description = "Bearer does not own the job"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_job(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let job = state.job_service.get_by_id(id).await?;
    claims.require_owner(job.employer_id)?;

    let outcome = state.job_service.delete_cascade(&job).await?;
    Ok(Json(DeleteJobResponse {
        success: true,
        message: "Job and associated data deleted successfully".to_string(),
        deleted_job_id: id,
        deleted_applications: outcome.deleted_applications,
        deleted_resumes: outcome.deleted_resumes,
    }))
}

#[utoipa::path(
    get,
    path = "/api/jobs",
    params(("employerId" = Uuid, Query, description = "Employer ID")),
    responses(
        (status = 200, description = "Jobs for the employer"),
        (status = 403, description = "Bearer is not the employer")
    )
)]
#[axum::debug_handler]
pub async fn list_jobs(
    State(state): State<AppState>,
    claims: Claims,
    Query(query): Query<JobListQuery>,
) -> Result<impl IntoResponse> {
    let employer_id = query
        .employer_id
        .ok_or_else(|| Error::BadRequest("Employer ID is required".to_string()))?;
    claims.require_owner(employer_id)?;

    let jobs = state.job_service.list_by_employer(employer_id).await?;
    Ok(Json(JobListResponse {
        success: true,
        all_jobs: jobs.into_iter().map(JobResponse::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/jobs/all",
    responses((status = 200, description = "All postings"))
)]
#[axum::debug_handler]
pub async fn list_all_jobs(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let jobs = state.job_service.list_all().await?;
    Ok(Json(JobListResponse {
        success: true,
        all_jobs: jobs.into_iter().map(JobResponse::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/jobs/{id}/applications",
    params(("id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Applications for the job"),
        (status = 403, description = "Bearer does not own the job"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn list_job_applications(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let job = state.job_service.get_by_id(id).await?;
    claims.require_owner(job.employer_id)?;

    let applications = state.application_service.list_by_job(id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "data": applications,
    })))
}
