use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

/// Issues a signed HS256 session token for the given identity. The payload is
/// the same typed `Claims` struct the auth middleware decodes, so the session
/// schema lives in exactly one place.
pub fn issue_token(user_id: Uuid, role: &str, secret: &str, ttl_hours: i64) -> Result<String> {
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        role: Some(role.to_string()),
        iat: now.timestamp() as usize,
        exp: (now + chrono::Duration::hours(ttl_hours)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("Failed to sign token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

    #[test]
    fn issued_token_roundtrips() {
        let id = Uuid::new_v4();
        let token = issue_token(id, "employer", "test-secret", 24).expect("token");

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &validation,
        )
        .expect("decode");

        assert_eq!(data.claims.sub, id.to_string());
        assert_eq!(data.claims.role.as_deref(), Some("employer"));
        assert!(data.claims.exp > data.claims.iat);
    }

    #[test]
    fn wrong_secret_fails_decode() {
        let token = issue_token(Uuid::new_v4(), "candidate", "secret-a", 24).expect("token");
        let validation = Validation::new(Algorithm::HS256);
        assert!(decode::<Claims>(&token, &DecodingKey::from_secret(b"secret-b"), &validation).is_err());
    }
}
