use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    dto::auth_dto::{LoginPayload, LoginResponse, SignupResponse},
    dto::user_dto::UserResponse,
    error::{Error, Result},
    models::user::is_valid_role,
    services::storage_service::{RESOURCE_IMAGE, RESOURCE_RAW},
    services::user_service::NewUser,
    utils::crypto::verify_password,
    utils::normalize::skills_from_str,
    utils::token::issue_token,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    responses(
        (status = 201, description = "Account created"),
        (status = 400, description = "Missing fields or email already registered")
    )
)]
#[axum::debug_handler]
pub async fn signup(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut name = String::new();
    let mut email = String::new();
    let mut password = String::new();
    let mut role = String::new();
    let mut bio = String::new();
    let mut skills = Vec::new();
    let mut resume_url = String::new();
    let mut profile_picture_url = String::new();

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "name" => name = field.text().await.unwrap_or_default(),
            "email" => email = field.text().await.unwrap_or_default(),
            "password" => password = field.text().await.unwrap_or_default(),
            "role" => role = field.text().await.unwrap_or_default(),
            "bio" => bio = field.text().await.unwrap_or_default(),
            "skills" => {
                let raw = field.text().await.unwrap_or_default();
                skills = skills_from_str(&raw);
            }
            "resume" => {
                let filename = field.file_name().unwrap_or("resume.pdf").to_string();
                let data = field.bytes().await?;
                if !data.is_empty() {
                    // primary-path upload: a storage failure rejects signup
                    let stored = state.storage.upload(data, &filename, RESOURCE_RAW).await?;
                    resume_url = stored.secure_url;
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
                    profile_picture_url = stored.secure_url;
                }
            }
            _ => {}
        }
    }

    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(Error::BadRequest(
            "Name, email and password are required".to_string(),
        ));
    }
    if !is_valid_role(&role) {
        return Err(Error::BadRequest(
            "Role must be employer or candidate".to_string(),
        ));
    }

    let user = state
        .user_service
        .create(NewUser {
            name,
            email,
            password,
            role,
            bio,
            skills,
            resume_url,
            profile_picture_url,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully".to_string(),
            user: UserResponse::from(user),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    responses(
        (status = 200, description = "Login successful"),
        (status = 400, description = "Invalid email or password")
    )
)]
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let Some(user) = state.user_service.get_by_email(&payload.email).await? else {
        return Err(Error::BadRequest("Invalid email or password".to_string()));
    };
    let ok = verify_password(&payload.password, &user.password_hash)
        .map_err(|e| Error::Internal(format!("Password verification failed: {}", e)))?;
    if !ok {
        return Err(Error::BadRequest("Invalid email or password".to_string()));
    }

    let config = crate::config::get_config();
    let token = issue_token(user.id, &user.role, &config.jwt_secret, config.token_ttl_hours)?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        user: UserResponse::from(user),
    }))
}
