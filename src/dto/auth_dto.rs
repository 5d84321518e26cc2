use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::dto::user_dto::UserResponse;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupResponse {
    pub message: String,
    pub user: UserResponse,
}
