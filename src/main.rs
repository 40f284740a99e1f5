use std::net::SocketAddr;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use grimoire_api::config::config;
use grimoire_api::database::manager;
use grimoire_api::handlers::{auth, func};
use grimoire_api::middleware::auth::require_auth;
use grimoire_api::middleware::security::{self, RateLimiter};
use grimoire_api::AppState;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = config();
    if config.security.jwt_secret.is_empty() {
        eprintln!("JWT_SECRET is not set; refusing to start");
        std::process::exit(1);
    }

    let pool = match manager::connect().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("database setup failed: {e}");
            std::process::exit(1);
        }
    };

    let app = app(AppState { pool });

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Grimoire API listening on http://{}", bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("server");
}

fn app(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/delete-user", delete(auth::delete_user))
        .route("/is-logged-in", get(auth::is_logged_in))
        // Stricter window for credential endpoints.
        .layer(from_fn_with_state(
            RateLimiter::auth(),
            security::rate_limit,
        ));

    let func_routes =
        func::routes(state.clone()).layer(from_fn_with_state(state.clone(), require_auth));

    let router = Router::new()
        .route("/health", get(health))
        .nest("/api/auth", auth_routes)
        .nest("/api/func", func_routes)
        .layer(from_fn_with_state(
            RateLimiter::global(),
            security::rate_limit,
        ))
        .layer(security::cors_layer())
        .layer(DefaultBodyLimit::max(config().api.max_request_size_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    security::apply_security_headers(router)
}

async fn health(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();
    match manager::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "error",
                "message": "database unavailable",
                "data": { "status": "degraded", "timestamp": now, "database_error": e.to_string() }
            })),
        ),
    }
}
