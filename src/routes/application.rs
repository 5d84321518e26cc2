use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::application_dto::{
        ApplicationListQuery, ApplicationResponse, DeleteApplicationResponse, DownloadResponse,
        SubmitApplicationPayload, UpdateStatusPayload,
    },
    error::{Error, Result},
    middleware::auth::Claims,
    models::application::ApplicationStatus,
    utils::locator::safe_resume_filename,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/applications",
    request_body = SubmitApplicationPayload,
    responses(
        (status = 201, description = "Application submitted"),
        (status = 404, description = "Job or user not found"),
        (status = 409, description = "Already applied to this job")
    )
)]
#[axum::debug_handler]
pub async fn submit_application(
    State(state): State<AppState>,
    claims: Claims,
    Json(payload): Json<SubmitApplicationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    claims.require_owner(payload.applicant_id)?;

    let application = state.application_service.submit(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApplicationResponse {
            success: true,
            message: "Application submitted successfully".to_string(),
            data: application,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/applications",
    params(("applicantId" = Uuid, Query, description = "Applicant ID")),
    responses(
        (status = 200, description = "Applications for the applicant"),
        (status = 403, description = "Bearer is not the applicant")
    )
)]
#[axum::debug_handler]
pub async fn list_applications(
    State(state): State<AppState>,
    claims: Claims,
    Query(query): Query<ApplicationListQuery>,
) -> Result<impl IntoResponse> {
    let applicant_id = query
        .applicant_id
        .ok_or_else(|| Error::BadRequest("Applicant ID is required".to_string()))?;
    claims.require_owner(applicant_id)?;

    let applications = state
        .application_service
        .list_by_applicant(applicant_id)
        .await?;
    Ok(Json(applications))
}

#[utoipa::path(
    get,
    path = "/api/applications/all",
    responses((status = 200, description = "All applications"))
)]
#[axum::debug_handler]
pub async fn list_all_applications(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let applications = state.application_service.list_all().await?;
    Ok(Json(serde_json::json!({
        "allApplications": applications,
    })))
}

#[utoipa::path(
    put,
    path = "/api/applications/{id}",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = UpdateStatusPayload,
    responses(
        (status = 200, description = "Status updated"),
        (status = 400, description = "Invalid status value"),
        (status = 403, description = "Bearer does not own the posting"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn update_application_status(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<impl IntoResponse> {
    let status: ApplicationStatus = payload
        .status
        .parse()
        .map_err(|_| Error::BadRequest("Invalid status value".to_string()))?;

    let application = state.application_service.get_by_id(id).await?;
    let job = state.job_service.get_by_id(application.job_id).await?;
    claims.require_owner(job.employer_id)?;

    let updated = state.application_service.update_status(id, status).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "data": updated,
    })))
}

#[utoipa::path(
    delete,
    path = "/api/applications/{id}",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Application deleted"),
        (status = 403, description = "Bearer does not own the posting"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_application(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let application = state.application_service.get_by_id(id).await?;
    let job = state.job_service.get_by_id(application.job_id).await?;
    claims.require_owner(job.employer_id)?;

    let cloudinary_deleted = state.application_service.delete(&application).await?;
    Ok(Json(DeleteApplicationResponse {
        success: true,
        message: "Application deleted successfully".to_string(),
        deleted_id: id,
        cloudinary_deleted,
    }))
}

#[utoipa::path(
    get,
    path = "/api/applications/{id}/download",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Resume download link"),
        (status = 404, description = "Application or resume not found")
    )
)]
#[axum::debug_handler]
pub async fn download_resume(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let application = state.application_service.get_by_id(id).await?;

    // the applicant and the posting owner may both fetch the resume
    if claims.user_id()? != application.applicant_id {
        let job = state.job_service.get_by_id(application.job_id).await?;
        claims.require_owner(job.employer_id)?;
    }

    if application.resume_url.is_empty() {
        return Err(Error::NotFound("No resume URL found".to_string()));
    }

    Ok(Json(DownloadResponse {
        success: true,
        url: application.resume_url.clone(),
        filename: safe_resume_filename(application.resume_filename.as_deref()),
    }))
}
