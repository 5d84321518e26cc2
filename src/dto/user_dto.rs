use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::user::User;

/// User record with the credential hash stripped and the profile fields
/// nested the way the clients consume them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub profile: ProfileResponse,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub bio: String,
    pub skills: Vec<String>,
    pub resume: String,
    pub profile_picture: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            profile: ProfileResponse {
                bio: user.bio,
                skills: user.skills,
                resume: user.resume_url,
                profile_picture: user.profile_picture_url,
            },
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEmailPayload {
    #[validate(email)]
    pub new_email: String,
    #[validate(length(min = 1))]
    pub current_password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordPayload {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 8))]
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateProfileResponse {
    pub success: bool,
    pub user: UserResponse,
}
