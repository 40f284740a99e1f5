//! Security middleware: response headers, CORS policy, rate limiting.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::{HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::config;

/// Fixed-window request counter keyed by client IP.
///
/// Windows are tracked in process memory; restarting the server resets all
/// counters. Two instances are mounted: a global tier and a stricter tier on
/// the auth routes.
#[derive(Clone)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    message: &'static str,
    hits: Arc<Mutex<HashMap<IpAddr, Window>>>,
}

#[derive(Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

// Once the map holds this many clients, expired windows are evicted before
// the next insert, so one-off IPs cannot grow it without bound.
const SWEEP_THRESHOLD: usize = 1024;

impl RateLimiter {
    pub fn global() -> Self {
        let api = &config().api;
        Self::new(
            api.rate_limit_requests,
            Duration::from_secs(api.rate_limit_window_secs),
            "Too many requests, please try again later.",
        )
    }

    pub fn auth() -> Self {
        let api = &config().api;
        Self::new(
            api.auth_rate_limit_requests,
            Duration::from_secs(api.auth_rate_limit_window_secs),
            "Too many authentication attempts. Please try again later.",
        )
    }

    fn new(max_requests: u32, window: Duration, message: &'static str) -> Self {
        Self {
            max_requests,
            window,
            message,
            hits: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn allow(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let mut hits = self.hits.lock().unwrap_or_else(|e| e.into_inner());
        if hits.len() >= SWEEP_THRESHOLD {
            let window = self.window;
            hits.retain(|_, w| now.duration_since(w.started) < window);
        }
        let window = hits.entry(ip).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(window.started) >= self.window {
            window.started = now;
            window.count = 0;
        }
        window.count += 1;
        window.count <= self.max_requests
    }
}

pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    if !limiter.allow(addr.ip()) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "status": "fail", "message": limiter.message })),
        )
            .into_response();
    }
    next.run(request).await
}

/// CORS from the configured origin allow-list; permissive when unconfigured.
pub fn cors_layer() -> CorsLayer {
    let origins = &config().security.cors_origins;
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
}

/// Baseline hardening headers on every response.
pub fn apply_security_headers(router: Router) -> Router {
    const HEADERS: [(&str, &str); 5] = [
        ("x-content-type-options", "nosniff"),
        ("x-frame-options", "DENY"),
        ("x-xss-protection", "0"),
        ("x-dns-prefetch-control", "off"),
        ("referrer-policy", "no-referrer"),
    ];

    HEADERS.into_iter().fold(router, |router, (name, value)| {
        router.layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ))
    })
}
