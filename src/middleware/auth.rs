//! Session/auth guard.
//!
//! Applied to everything under `/api/func`. Beyond signature and expiry, the
//! token's `session_id` must still match the user's stored `active_session`;
//! a token left over from before another login is rejected even though it is
//! cryptographically valid.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::auth::validate_token;
use crate::config::config;
use crate::database::models::user;
use crate::error::ApiError;
use crate::types::ObjectId;
use crate::AppState;

/// Identity of the authenticated caller, inserted into request extensions.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: ObjectId,
    pub username: String,
    pub email: String,
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&request)
        .ok_or_else(|| ApiError::authentication_required("No authentication token provided"))?;

    let claims = validate_token(token, &config().security.jwt_secret)
        .map_err(|_| ApiError::authentication_required("Invalid or expired token"))?;

    let user = user::find_by_id(&state.pool, &claims.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if user.active_session.as_deref() != Some(claims.session_id.as_str()) {
        return Err(ApiError::session_expired(
            "Your session has expired because you logged in from another device",
        ));
    }

    request.extensions_mut().insert(AuthUser {
        id: claims.id,
        username: claims.username,
        email: claims.email,
    });

    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
