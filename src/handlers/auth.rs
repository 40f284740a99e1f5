//! Account endpoints: register, login, logout, delete-user, is-logged-in.
//!
//! These keep the original bare wire shapes (`{token, id}`, `{message}`,
//! `{isLoggedIn, ..}`) rather than the resource envelope.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::auth::{self, generate_token, new_session_id, validate_token, Claims};
use crate::config::config;
use crate::database::models::user;
use crate::error::ApiError;
use crate::extract::Json;
use crate::types::ObjectId;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterPayload {
    #[validate(length(min = 3, max = 30, message = "Username must be 3 to 30 characters"))]
    pub username: String,
    #[validate(length(min = 8, max = 30, message = "Password must be 8 to 30 characters"))]
    pub password: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

fn validate_register(payload: &RegisterPayload) -> Result<(), ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;
    if !payload.username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ApiError::validation("Username must be alphanumeric"));
    }
    if !payload.password.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ApiError::validation(
            "Password must contain only letters and numbers",
        ));
    }
    Ok(())
}

/// `POST /api/auth/register` — create an account and log it straight in.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<Response, ApiError> {
    validate_register(&payload)?;

    let password_hash = auth::password::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let session_id = new_session_id();
    let user = user::insert(
        &state.pool,
        &payload.username,
        &payload.email,
        &password_hash,
        &session_id,
    )
    .await?;

    let claims = Claims::new(&user, session_id, config().security.jwt_expiry_hours);
    let token = generate_token(&claims, &config().security.jwt_secret)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    tracing::info!(username = %user.username, "registered new user");
    Ok((StatusCode::OK, Json(json!({ "token": token, "id": user.id }))).into_response())
}

/// `POST /api/auth/login` — verify credentials and rotate the active
/// session, which invalidates every previously issued token.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Response, ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;

    // Same error for unknown user and bad password.
    let user = user::find_by_username(&state.pool, &payload.username)
        .await?
        .ok_or_else(|| ApiError::validation("Invalid username or password"))?;

    let matches = auth::password::verify_password(&payload.password, &user.password_hash)
        .map_err(|e| ApiError::internal(e.to_string()))?;
    if !matches {
        return Err(ApiError::validation("Invalid username or password"));
    }

    let session_id = new_session_id();
    let claims = Claims::new(&user, session_id.clone(), config().security.jwt_expiry_hours);
    let token = generate_token(&claims, &config().security.jwt_secret)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    user::rotate_session(&state.pool, &user.id, &session_id).await?;

    Ok((StatusCode::OK, Json(json!({ "token": token, "id": user.id }))).into_response())
}

#[derive(Debug, Deserialize)]
pub struct LogoutPayload {
    pub token: Option<String>,
}

/// `POST /api/auth/logout` — clear the active session so the presented
/// token (and any sibling) stops working immediately.
pub async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<LogoutPayload>,
) -> Result<Response, ApiError> {
    let token = payload
        .token
        .ok_or_else(|| ApiError::validation("No token provided"))?;

    let claims = validate_token(&token, &config().security.jwt_secret)
        .map_err(|_| ApiError::authentication_required("Invalid token"))?;

    user::clear_session(&state.pool, &claims.id).await?;

    Ok((StatusCode::OK, Json(json!({ "message": "Logged out successfully" }))).into_response())
}

#[derive(Debug, Deserialize)]
pub struct DeleteUserPayload {
    #[serde(rename = "userId")]
    pub user_id: String,
}

/// `DELETE /api/auth/delete-user` — remove the account and everything it
/// owns.
pub async fn delete_user(
    State(state): State<AppState>,
    Json(payload): Json<DeleteUserPayload>,
) -> Result<Response, ApiError> {
    let id = ObjectId::parse(&payload.user_id)?;
    if !user::delete(&state.pool, &id).await? {
        return Err(ApiError::not_found("User not found"));
    }
    Ok((StatusCode::OK, Json(json!({ "message": "User successfully deleted" }))).into_response())
}

/// `GET /api/auth/is-logged-in` — session probe for clients. The token may
/// arrive in the Authorization header, a `token` query parameter, or a JSON
/// body; first one present wins.
pub async fn is_logged_in(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Option<Json<Value>>,
) -> Result<Response, ApiError> {
    let from_header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);
    let from_query = params.get("token").cloned();
    let from_body = body
        .as_ref()
        .and_then(|Json(value)| value.get("token"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let Some(token) = from_header.or(from_query).or(from_body) else {
        return Ok(probe(
            StatusCode::UNAUTHORIZED,
            false,
            "No authentication token provided",
        ));
    };

    let claims = match validate_token(&token, &config().security.jwt_secret) {
        Ok(claims) => claims,
        Err(_) => {
            return Ok(probe(
                StatusCode::UNAUTHORIZED,
                false,
                "Invalid or expired token",
            ))
        }
    };

    let Some(user) = user::find_by_id(&state.pool, &claims.id).await? else {
        return Ok(probe(StatusCode::NOT_FOUND, false, "User not found"));
    };

    if user.active_session.as_deref() != Some(claims.session_id.as_str()) {
        return Ok(probe(
            StatusCode::UNAUTHORIZED,
            false,
            "Your session has expired because you logged in from another device",
        ));
    }

    let body = json!({
        "isLoggedIn": true,
        "user": {
            "id": claims.id,
            "username": claims.username,
            "email": claims.email,
        }
    });
    Ok((StatusCode::OK, Json(body)).into_response())
}

fn probe(status: StatusCode, logged_in: bool, message: &str) -> Response {
    (
        status,
        Json(json!({ "isLoggedIn": logged_in, "message": message })),
    )
        .into_response()
}
