//! Success envelope builders.
//!
//! Resource endpoints respond `{status: "success", data: {<resource>: ...}}`;
//! list responses additionally carry a `results` count. The error half of the
//! envelope lives on `ApiError`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Map, Value};

fn envelope(name: &str, value: Value) -> Value {
    let mut data = Map::new();
    data.insert(name.to_string(), value);
    json!({ "status": "success", "data": data })
}

pub fn created<T: Serialize>(name: &str, record: &T) -> Response {
    let value = serde_json::to_value(record).unwrap_or(Value::Null);
    (StatusCode::CREATED, Json(envelope(name, value))).into_response()
}

pub fn record<T: Serialize>(name: &str, record: &T) -> Response {
    let value = serde_json::to_value(record).unwrap_or(Value::Null);
    (StatusCode::OK, Json(envelope(name, value))).into_response()
}

/// List envelope; `items` are pre-serialized so field projection can run
/// before they get here.
pub fn list(name: &str, items: Vec<Value>) -> Response {
    let results = items.len();
    let mut data = Map::new();
    data.insert(name.to_string(), Value::Array(items));
    let body = json!({ "status": "success", "results": results, "data": data });
    (StatusCode::OK, Json(body)).into_response()
}

pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Bare confirmation body, used by auth and relationship endpoints that keep
/// the original wire shape instead of the resource envelope.
pub fn message(text: &str) -> Response {
    (StatusCode::OK, Json(json!({ "message": text }))).into_response()
}
