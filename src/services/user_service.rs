use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::user::User;
use crate::utils::crypto::{hash_password, verify_password};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, bio, skills, resume_url, \
     profile_picture_url, created_at";

pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub bio: String,
    pub skills: Vec<String>,
    pub resume_url: String,
    pub profile_picture_url: String,
}

/// Partial profile update; `None` leaves the stored value untouched.
#[derive(Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub profile_picture_url: Option<String>,
}

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new_user: NewUser) -> Result<User> {
        let existing = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE email = $1")
            .bind(&new_user.email)
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(Error::BadRequest("User already exists".to_string()));
        }

        let password_hash = hash_password(&new_user.password)
            .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users
                (name, email, password_hash, role, bio, skills, resume_url, profile_picture_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&password_hash)
        .bind(&new_user.role)
        .bind(&new_user.bio)
        .bind(&new_user.skills)
        .bind(&new_user.resume_url)
        .bind(&new_user.profile_picture_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;
        Ok(user)
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Changes the account email after re-verifying the current password.
    /// The verification happens before any mutation.
    pub async fn change_email(
        &self,
        id: Uuid,
        new_email: &str,
        current_password: &str,
    ) -> Result<User> {
        let user = self.get_by_id(id).await?;
        let ok = verify_password(current_password, &user.password_hash)
            .map_err(|e| Error::Internal(format!("Password verification failed: {}", e)))?;
        if !ok {
            return Err(Error::Unauthorized("Invalid password".to_string()));
        }

        let claimed_by_other = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM users WHERE email = $1 AND id <> $2",
        )
        .bind(new_email)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        if claimed_by_other.is_some() {
            return Err(Error::BadRequest("Email already in use".to_string()));
        }

        let updated = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET email = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(new_email)
        .fetch_one(&self.pool)
        .await?;
        Ok(updated)
    }

    pub async fn change_password(
        &self,
        id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        let user = self.get_by_id(id).await?;
        let ok = verify_password(current_password, &user.password_hash)
            .map_err(|e| Error::Internal(format!("Password verification failed: {}", e)))?;
        if !ok {
            return Err(Error::Unauthorized(
                "Current password is incorrect".to_string(),
            ));
        }

        let new_hash = hash_password(new_password)
            .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))?;
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(&new_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Merges the provided subset of profile fields; omitted fields keep
    /// their stored values.
    pub async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                bio = COALESCE($3, bio),
                skills = COALESCE($4, skills),
                profile_picture_url = COALESCE($5, profile_picture_url)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&update.name)
        .bind(&update.bio)
        .bind(&update.skills)
        .bind(&update.profile_picture_url)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;
        Ok(user)
    }
}
