use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Typed session payload. This is the only place the token schema exists:
/// `utils::token` signs it at login and the guard below decodes it back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Option<String>,
    pub iat: usize,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| Error::Unauthorized("Invalid token subject".to_string()))
    }

    /// Ownership check: the bearer must be the owner of the target resource.
    /// Applied before any lookup result is revealed, so a non-owner gets 403
    /// whether or not the resource exists.
    pub fn require_owner(&self, owner_id: Uuid) -> Result<()> {
        if self.user_id()? == owner_id {
            Ok(())
        } else {
            Err(Error::Forbidden("Unauthorized access".to_string()))
        }
    }

    pub fn require_role(&self, role: &str) -> Result<()> {
        match self.role.as_deref() {
            Some(r) if r.eq_ignore_ascii_case(role) => Ok(()),
            _ => Err(Error::Forbidden(format!("Requires {} role", role))),
        }
    }
}

pub fn decode_bearer(headers: &HeaderMap) -> Result<Claims> {
    let Some(auth_header) = headers.get(header::AUTHORIZATION) else {
        return Err(Error::Unauthorized("missing_authorization".to_string()));
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Err(Error::Unauthorized("bad_authorization".to_string()));
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err(Error::Unauthorized("unsupported_scheme".to_string()));
    };

    let config = crate::config::get_config();
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| Error::Unauthorized("invalid_token".to_string()))
}

pub async fn require_bearer_auth(mut req: Request, next: Next) -> Response {
    match decode_bearer(req.headers()) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}

/// Lets handlers take `Claims` directly. Middleware-inserted claims are
/// reused when present; otherwise the bearer header is decoded here, so
/// routes that mix public and protected methods on one path still get a
/// proper 401 instead of a missing-extension error.
#[async_trait]
impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        if let Some(claims) = parts.extensions.get::<Claims>() {
            return Ok(claims.clone());
        }
        decode_bearer(&parts.headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims_for(id: Uuid, role: &str) -> Claims {
        Claims {
            sub: id.to_string(),
            role: Some(role.to_string()),
            iat: 0,
            exp: usize::MAX,
        }
    }

    #[test]
    fn owner_check_matches_subject() {
        let id = Uuid::new_v4();
        let claims = claims_for(id, "employer");
        assert!(claims.require_owner(id).is_ok());
        assert!(matches!(
            claims.require_owner(Uuid::new_v4()),
            Err(Error::Forbidden(_))
        ));
    }

    #[test]
    fn malformed_subject_is_unauthorized() {
        let claims = Claims {
            sub: "not-a-uuid".into(),
            role: None,
            iat: 0,
            exp: usize::MAX,
        };
        assert!(matches!(
            claims.require_owner(Uuid::new_v4()),
            Err(Error::Unauthorized(_))
        ));
    }

    #[test]
    fn role_check_is_case_insensitive() {
        let claims = claims_for(Uuid::new_v4(), "Employer");
        assert!(claims.require_role("employer").is_ok());
        assert!(matches!(
            claims.require_role("candidate"),
            Err(Error::Forbidden(_))
        ));
    }

    #[test]
    fn missing_and_malformed_headers_are_rejected() {
        let headers = HeaderMap::new();
        assert!(matches!(
            decode_bearer(&headers),
            Err(Error::Unauthorized(msg)) if msg == "missing_authorization"
        ));

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert!(matches!(
            decode_bearer(&headers),
            Err(Error::Unauthorized(msg)) if msg == "unsupported_scheme"
        ));
    }
}
