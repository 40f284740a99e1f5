// HTTP API error types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// HTTP API error with appropriate status codes and client-friendly messages.
///
/// Handlers return `Result<_, ApiError>` and propagate failures with `?`;
/// the `IntoResponse` impl renders the structured JSON error shape, so no
/// error ever escapes as an unformatted 500.
#[derive(Debug)]
pub enum ApiError {
    // 401 - no token, malformed token, bad signature, or expired
    AuthenticationRequired(String),

    // 401 - token is cryptographically valid but its session id is stale
    SessionExpired(String),

    // 403 - caller is not the owner/creator of the resource
    Forbidden(String),

    // 404 - missing resource or user
    NotFound(String),

    // 400 - missing/malformed payload or bad object-id format
    Validation(String),

    // 400 - duplicate username/email
    Conflict(String),

    // 500 - unexpected failure, logged and masked from the client
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::AuthenticationRequired(_) => StatusCode::UNAUTHORIZED,
            ApiError::SessionExpired(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-safe error message. Internal errors are masked here and
    /// logged at the point of conversion instead.
    pub fn message(&self) -> &str {
        match self {
            ApiError::AuthenticationRequired(msg)
            | ApiError::SessionExpired(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Validation(msg)
            | ApiError::Conflict(msg) => msg,
            ApiError::Internal(_) => "An error occurred while processing your request",
        }
    }

    /// "fail" for client errors (4xx), "error" for server errors (5xx).
    pub fn status_label(&self) -> &'static str {
        if self.status_code().is_server_error() {
            "error"
        } else {
            "fail"
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "status": self.status_label(),
            "message": self.message(),
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn authentication_required(message: impl Into<String>) -> Self {
        ApiError::AuthenticationRequired(message.into())
    }

    pub fn session_expired(message: impl Into<String>) -> Self {
        ApiError::SessionExpired(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        // Log the real error but return a generic message
        tracing::error!("SQLx error: {}", err);
        ApiError::Internal(err.to_string())
    }
}

impl From<crate::database::manager::DatabaseError> for ApiError {
    fn from(err: crate::database::manager::DatabaseError) -> Self {
        tracing::error!("Database error: {}", err);
        ApiError::Internal(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
