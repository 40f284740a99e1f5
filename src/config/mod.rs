use once_cell::sync::Lazy;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// HMAC secret for signing tokens. Empty means "not configured";
    /// token generation and validation refuse to run with an empty secret.
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    /// Allowed CORS origins. Empty list falls back to a permissive policy.
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub max_request_size_bytes: usize,
    pub default_page_size: i64,
    /// Global rate-limit tier: requests per window per client.
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
    /// Stricter tier applied to /api/auth endpoints.
    pub auth_rate_limit_requests: u32,
    pub auth_rate_limit_window_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                port: env_parse("PORT", 5000),
            },
            database: DatabaseConfig {
                max_connections: env_parse("DATABASE_MAX_CONNECTIONS", 10),
                connect_timeout_secs: env_parse("DATABASE_CONNECT_TIMEOUT", 30),
            },
            security: SecurityConfig {
                jwt_secret: env::var("JWT_SECRET").unwrap_or_default(),
                jwt_expiry_hours: env_parse("JWT_EXPIRY_HOURS", 48),
                cors_origins: env::var("CORS_ORIGIN")
                    .map(|v| {
                        v.split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            api: ApiConfig {
                max_request_size_bytes: env_parse("API_MAX_REQUEST_SIZE_BYTES", 1024 * 1024),
                default_page_size: env_parse("API_DEFAULT_PAGE_SIZE", 100),
                rate_limit_requests: env_parse("API_RATE_LIMIT_REQUESTS", 200),
                rate_limit_window_secs: env_parse("API_RATE_LIMIT_WINDOW_SECS", 900),
                auth_rate_limit_requests: env_parse("API_AUTH_RATE_LIMIT_REQUESTS", 10),
                auth_rate_limit_window_secs: env_parse("API_AUTH_RATE_LIMIT_WINDOW_SECS", 900),
            },
        }
    }
}

fn env_parse<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
