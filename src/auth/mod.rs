//! Token payloads and HS256 signing/validation.
//!
//! A session is never persisted as its own record: it exists only as the
//! signed claims below plus the `active_session` id stored on the user row.
//! Issuing a new token overwrites `active_session`, which invalidates every
//! previously issued token even while those remain cryptographically valid.

pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::database::models::user::User;
use crate::types::ObjectId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: ObjectId,
    pub username: String,
    pub email: String,
    /// The session identifier this token was issued under. Compared against
    /// the user's stored `active_session` on every authenticated request.
    pub session_id: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user: &User, session_id: String, expiry_hours: i64) -> Self {
        let now = Utc::now();
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            session_id,
            exp: (now + Duration::hours(expiry_hours)).timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Mint a fresh session identifier (same shape as record ids).
pub fn new_session_id() -> String {
    ObjectId::new().to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("JWT secret is not configured")]
    InvalidSecret,
}

pub fn generate_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    encode(
        &Header::default(), // HS256
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Validate signature and expiry, returning the embedded [`Claims`].
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(token_data.claims)
}
