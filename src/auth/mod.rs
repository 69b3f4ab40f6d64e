/*!
 * Session authentication: salted password hashing, signed session
 * tokens, and the `CurrentUser` extractor.
 *
 * A session is an HS256-signed claim set delivered as an HttpOnly
 * cookie. Non-browser clients may instead send the token as a bearer
 * Authorization header; both paths verify identically.
 */

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::entities::user;
use crate::errors::{ApiError, ServiceError};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "eshop_session";

/// Claim structure for session tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub remember: bool,
}

/// Verified session identity
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub username: String,
}

/// Issues and verifies session tokens.
pub struct SessionService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    ttl_remember: Duration,
}

impl SessionService {
    pub fn new(secret: &str, ttl: Duration, ttl_remember: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
            ttl_remember,
        }
    }

    fn ttl_for(&self, remember: bool) -> Duration {
        if remember {
            self.ttl_remember
        } else {
            self.ttl
        }
    }

    /// Signs a session token for the given user.
    pub fn issue(&self, user: &user::Model, remember: bool) -> Result<String, ServiceError> {
        let now = Utc::now();
        let ttl = self.ttl_for(remember);
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: now.timestamp() + ttl.as_secs() as i64,
            remember,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ServiceError::AuthError(format!("Token creation failed: {}", e)))
    }

    /// Verifies a session token and returns the identity it carries.
    pub fn verify(&self, token: &str) -> Result<SessionUser, ServiceError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| ServiceError::AuthError("Invalid session".to_string()))?;

        let user_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| ServiceError::AuthError("Invalid session".to_string()))?;

        Ok(SessionUser {
            user_id,
            username: data.claims.username,
        })
    }

    /// Builds the Set-Cookie value establishing a session.
    pub fn cookie(&self, token: &str, remember: bool) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE,
            token,
            self.ttl_for(remember).as_secs()
        )
    }

    /// Builds the Set-Cookie value clearing the session.
    pub fn clear_cookie(&self) -> String {
        format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
    }
}

/// Hashes a password with a per-hash random salt.
pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::HashError(e.to_string()))
}

/// Verifies a password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Authenticated caller extracted from the session cookie or bearer
/// header. Handlers that require login take this as an argument.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub username: String,
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

fn cookie_token(parts: &Parts) -> Option<String> {
    let raw = parts.headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(&format!("{}=", SESSION_COOKIE)))
        .map(|token| token.to_string())
}

fn extract_session(parts: &Parts) -> Result<CurrentUser, ApiError> {
    let sessions = parts
        .extensions
        .get::<Arc<SessionService>>()
        .ok_or(ApiError::InternalServerError)?;

    let token = bearer_token(parts)
        .or_else(|| cookie_token(parts))
        .ok_or(ApiError::Unauthorized)?;

    let session = sessions.verify(&token).map_err(|_| ApiError::Unauthorized)?;

    Ok(CurrentUser {
        user_id: session.user_id,
        username: session.username,
    })
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        extract_session(parts)
    }
}

impl<S> OptionalFromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(extract_session(parts).ok())
    }
}
