use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::user_dto::{
        ChangeEmailPayload, ChangePasswordPayload, UpdateProfileResponse, UserResponse,
    },
    error::Result,
    middleware::auth::Claims,
    services::storage_service::RESOURCE_IMAGE,
    services::user_service::ProfileUpdate,
    utils::normalize::skills_from_str,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User record"),
        (status = 403, description = "Bearer is not this user"),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    claims.require_owner(id)?;
    let user = state.user_service.get_by_id(id).await?;
    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Profile updated"),
        (status = 403, description = "Bearer is not this user")
    )
)]
#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    claims.require_owner(id)?;

    let mut update = ProfileUpdate::default();

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "name" => {
                let value = field.text().await.unwrap_or_default();
                if !value.is_empty() {
                    update.name = Some(value);
                }
            }
            "bio" => {
                let value = field.text().await.unwrap_or_default();
                if !value.is_empty() {
                    update.bio = Some(value);
                }
            }
            "skills" => {
                let raw = field.text().await.unwrap_or_default();
                if !raw.is_empty() {
                    update.skills = Some(skills_from_str(&raw));
                }
            }
            "profilePicture" => {
                let filename = field.file_name().unwrap_or("picture.png").to_string();
                let data = field.bytes().await?;
                if !data.is_empty() {
                    let stored = state
                        .storage
                        .upload(data, &filename, RESOURCE_IMAGE)
                        .await?;
                    update.profile_picture_url = Some(stored.secure_url);
                }
            }
            _ => {}
        }
    }

    let user = state.user_service.update_profile(id, update).await?;
    Ok(Json(UpdateProfileResponse {
        success: true,
        user: UserResponse::from(user),
    }))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}/email",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = ChangeEmailPayload,
    responses(
        (status = 200, description = "Email updated"),
        (status = 400, description = "Email already in use"),
        (status = 401, description = "Current password is wrong")
    )
)]
#[axum::debug_handler]
pub async fn change_email(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeEmailPayload>,
) -> Result<impl IntoResponse> {
    claims.require_owner(id)?;
    payload.validate()?;

    let user = state
        .user_service
        .change_email(id, &payload.new_email, &payload.current_password)
        .await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "email": user.email,
    })))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}/password",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = ChangePasswordPayload,
    responses(
        (status = 200, description = "Password updated"),
        (status = 401, description = "Current password is wrong")
    )
)]
#[axum::debug_handler]
pub async fn change_password(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangePasswordPayload>,
) -> Result<impl IntoResponse> {
    claims.require_owner(id)?;
    payload.validate()?;

    state
        .user_service
        .change_password(id, &payload.current_password, &payload.new_password)
        .await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Password updated successfully",
    })))
}
