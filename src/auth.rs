//! Password hashing (Argon2id), bearer tokens (HS256 JWT) and the axum
//! extractors that guard user and admin routes.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Failed to hash password: {0}")]
    Hash(String),

    #[error("Invalid password hash: {0}")]
    MalformedHash(String),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Token subject is not a valid id")]
    InvalidSubject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn subject_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::InvalidSubject)
    }
}

/// Hash a password using Argon2id. Returns a PHC-format string.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// Verify a password against a PHC-format hash string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthError::MalformedHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

pub fn issue_token(secret: &str, subject: Uuid, role: Role, ttl_secs: u64) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: subject.to_string(),
        role,
        iat: now,
        exp: now.saturating_add(i64::try_from(ttl_secs).unwrap_or(i64::MAX)),
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

pub fn verify_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

fn bearer_claims(parts: &Parts, state: &AppState) -> Result<Claims, ApiError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization Header"))?;
    let token = header
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Missing 'Bearer' type in 'Authorization' header"))?;

    verify_token(&state.config.auth.jwt_secret, token).map_err(|e| {
        tracing::debug!("Rejected bearer token: {e}");
        match e {
            AuthError::Token(ref inner)
                if matches!(
                    inner.kind(),
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature
                ) =>
            {
                ApiError::unauthorized("Token has expired")
            }
            _ => ApiError::unauthorized("Invalid token"),
        }
    })
}

/// The authenticated end user making the request.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state)?;
        if claims.role != Role::User {
            return Err(ApiError::forbidden("User token required"));
        }
        let id = claims
            .subject_id()
            .map_err(|_| ApiError::unauthorized("Invalid token"))?;
        Ok(Self { id })
    }
}

/// The authenticated admin console operator.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser {
    pub id: Uuid,
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state)?;
        if claims.role != Role::Admin {
            return Err(ApiError::forbidden("Admin access required"));
        }
        let id = claims
            .subject_id()
            .map_err(|_| ApiError::unauthorized("Invalid token"))?;
        Ok(Self { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("s3cret!").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("s3cret!", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(matches!(
            verify_password("x", "not-a-phc-string"),
            Err(AuthError::MalformedHash(_))
        ));
    }

    #[test]
    fn test_token_carries_subject_and_role() {
        let id = Uuid::new_v4();
        let token = issue_token("secret", id, Role::Admin, 60).unwrap();
        let claims = verify_token("secret", &token).unwrap();
        assert_eq!(claims.subject_id().unwrap(), id);
        assert_eq!(claims.role, Role::Admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_huge_ttl_saturates_expiry() {
        let id = Uuid::new_v4();
        for ttl in [u64::MAX, i64::MAX as u64, (i64::MAX - 1) as u64] {
            let token = issue_token("secret", id, Role::User, ttl).unwrap();
            let claims = verify_token("secret", &token).unwrap();
            assert_eq!(claims.exp, i64::MAX);
        }
    }

    #[test]
    fn test_token_with_wrong_secret_is_rejected() {
        let token = issue_token("secret", Uuid::new_v4(), Role::User, 60).unwrap();
        assert!(verify_token("other", &token).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            role: Role::User,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        let err = verify_token("secret", &token).unwrap_err();
        match err {
            AuthError::Token(inner) => assert!(matches!(
                inner.kind(),
                jsonwebtoken::errors::ErrorKind::ExpiredSignature
            )),
            other => panic!("expected token error, got {other:?}"),
        }
    }
}
