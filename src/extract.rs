//! Request body extraction.
//!
//! Wraps `axum::Json` so body rejections (malformed JSON, missing or
//! mistyped fields, wrong content type) render the standard
//! `{status: "fail", message}` error shape with a 400, instead of axum's
//! plain-text 400/422 defaults.

use async_trait::async_trait;
use axum::extract::{FromRequest, Request};
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;

#[derive(Debug)]
pub struct Json<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Json(value)),
            Err(rejection) => Err(ApiError::validation(rejection.body_text())),
        }
    }
}

// Handlers also build responses with this type, so it serializes the same
// way as `axum::Json`.
impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header::CONTENT_TYPE;
    use axum::http::{Request as HttpRequest, StatusCode};
    use serde_json::Value;

    fn json_request(body: &'static str) -> Request {
        HttpRequest::builder()
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn malformed_body_becomes_a_400_validation_error() {
        let err = Json::<Value>::from_request(json_request("{not json"), &())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_json()["status"], "fail");
    }

    #[tokio::test]
    async fn missing_field_becomes_a_400_validation_error() {
        #[derive(Debug, serde::Deserialize)]
        struct Payload {
            #[allow(dead_code)]
            name: String,
        }

        let err = Json::<Payload>::from_request(json_request("{}"), &())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_json()["status"], "fail");
    }

    #[tokio::test]
    async fn valid_body_deserializes() {
        let Json(value) = Json::<Value>::from_request(json_request("{\"a\": 1}"), &())
            .await
            .unwrap();
        assert_eq!(value["a"], 1);
    }
}
