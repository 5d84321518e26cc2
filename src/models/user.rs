use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const ROLE_EMPLOYER: &str = "employer";
pub const ROLE_CANDIDATE: &str = "candidate";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub bio: String,
    pub skills: Vec<String>,
    pub resume_url: String,
    pub profile_picture_url: String,
    pub created_at: DateTime<Utc>,
}

pub fn is_valid_role(role: &str) -> bool {
    role == ROLE_EMPLOYER || role == ROLE_CANDIDATE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_roles_only() {
        assert!(is_valid_role("employer"));
        assert!(is_valid_role("candidate"));
        assert!(!is_valid_role("admin"));
        assert!(!is_valid_role(""));
    }
}
