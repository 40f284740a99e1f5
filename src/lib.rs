pub mod auth;
pub mod config;
pub mod controller;
pub mod database;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod query;
pub mod types;

use sqlx::PgPool;

/// Shared application state handed to handlers and middleware via axum's `State`.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
}
