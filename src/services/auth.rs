//! Access-token issuance/validation and password hashing.
//!
//! Tokens are HS512-signed JWTs whose subject is the user's email. Handlers
//! obtain the caller identity once at the boundary through the [`AuthUser`]
//! extractor and pass it explicitly into every operation; there is no
//! ambient current-user state anywhere in the pipeline.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::error::ApiError;

/// Signing material and lifetime policy for access tokens.
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiration: Duration,
}

/// Claims embedded in every access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's email.
    pub sub: String,
    /// Issued-at (UTC Unix timestamp).
    pub iat: i64,
    /// Expiration (UTC Unix timestamp).
    pub exp: i64,
}

impl AuthKeys {
    pub fn new(secret: &str, expiration_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiration: Duration::seconds(expiration_secs),
        }
    }

    /// Issue a token identifying the given user.
    pub fn generate_token(&self, email: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: email.to_string(),
            iat: now.timestamp(),
            exp: (now + self.expiration).timestamp(),
        };
        encode(&Header::new(Algorithm::HS512), &claims, &self.encoding).map_err(AuthError::Token)
    }

    /// Validate a token's signature and expiry, returning its claims.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS512))
            .map_err(AuthError::Token)?;
        Ok(data.claims)
    }
}

/// Hash a plaintext password using Argon2id with a random salt.
///
/// Returns the PHC-formatted hash string; algorithm parameters and salt are
/// embedded in the hash itself.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(AuthError::PasswordHash)?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored PHC-formatted hash.
///
/// Returns `Ok(false)` on a mismatch; `Err` only for malformed hashes.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(AuthError::PasswordHash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::PasswordHash(e)),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("password hash error: {0}")]
    PasswordHash(argon2::password_hash::Error),
}

/// Authenticated caller identity, extracted from the `Authorization: Bearer`
/// header of the request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Email the verified token was issued for.
    pub email: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing Authorization header".into()))?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::Unauthorized("invalid Authorization format, expected: Bearer <token>".into())
        })?;

        let claims = state
            .auth
            .verify_token(token)
            .map_err(|_| ApiError::Unauthorized("invalid or expired token".into()))?;

        Ok(AuthUser { email: claims.sub })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        let keys = AuthKeys::new("test-secret-at-least-this-long", 3600);
        let token = keys.generate_token("lifter@example.com").unwrap();

        let claims = keys.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "lifter@example.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_rejected_with_wrong_secret() {
        let keys = AuthKeys::new("secret-one", 3600);
        let other = AuthKeys::new("secret-two", 3600);

        let token = keys.generate_token("lifter@example.com").unwrap();
        assert!(other.verify_token(&token).is_err());
    }

    #[test]
    fn expired_token_rejected() {
        // Issue a token that expired well past the default validation leeway.
        let keys = AuthKeys::new("test-secret", -3600);
        let token = keys.generate_token("lifter@example.com").unwrap();
        assert!(keys.verify_token(&token).is_err());
    }

    #[test]
    fn password_hash_and_verify() {
        let hash = hash_password("correct-horse-battery-staple").unwrap();
        assert!(hash.starts_with("$argon2id$"));

        assert!(verify_password("correct-horse-battery-staple", &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }
}
