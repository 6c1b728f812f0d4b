use std::time::Duration;

use axum::http::Method;

/// Gateway configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Identity-verification endpoint used for proxied HTTP requests.
    pub auth_verify_url: String,
    /// Shared secret for verifying realtime session tokens.
    pub session_secret: String,
    /// Allowed CORS origins; `*` allows any.
    pub allowed_origins: Vec<String>,
    /// Path of the JSON route-table file.
    pub route_table_path: String,
    /// Header carrying the request correlation id.
    pub correlation_header: String,
    /// Path prefixes that require a bearer token.
    pub protected_prefixes: Vec<String>,
    /// Routes exempt from bearer authentication.
    pub public_routes: Vec<PublicRoute>,
    /// Upper bound on a proxied upstream request.
    pub proxy_timeout: Duration,
    /// Upper bound on an identity-verification call. Kept separate from the
    /// proxy timeout so a hanging verifier cannot stall the whole pipeline
    /// for the full proxy budget.
    pub auth_timeout: Duration,
}

/// A `(method, path-suffix)` pair exempt from authentication.
#[derive(Debug, Clone)]
pub struct PublicRoute {
    pub method: Method,
    pub suffix: String,
}

const DEFAULT_PUBLIC_ROUTES: &str = "POST /login,POST /register,POST /validate-token";

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Panics with a descriptive message if a required variable is missing.
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4000),
            auth_verify_url: required_var("AUTH_VERIFY_URL"),
            session_secret: required_var("SESSION_TOKEN_SECRET"),
            allowed_origins: parse_list(&var_or("ALLOWED_ORIGINS", "*")),
            route_table_path: var_or("ROUTE_TABLE_PATH", "routes.json"),
            correlation_header: var_or("CORRELATION_HEADER", "x-correlation-id"),
            protected_prefixes: parse_list(&var_or("PROTECTED_PREFIXES", "/api")),
            public_routes: parse_public_routes(&var_or("PUBLIC_ROUTES", DEFAULT_PUBLIC_ROUTES)),
            proxy_timeout: secs_var("PROXY_TIMEOUT_SECS", 30),
            auth_timeout: secs_var("AUTH_TIMEOUT_SECS", 5),
        }
    }
}

fn required_var(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| panic!("{name} env var is required"))
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn secs_var(name: &str, default: u64) -> Duration {
    Duration::from_secs(
        std::env::var(name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default),
    )
}

/// Parse a comma-separated list, dropping empty entries.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse comma-separated `METHOD suffix` pairs. Malformed pairs are dropped.
fn parse_public_routes(raw: &str) -> Vec<PublicRoute> {
    raw.split(',')
        .filter_map(|pair| {
            let mut parts = pair.trim().splitn(2, ' ');
            let method = parts.next()?.parse::<Method>().ok()?;
            let suffix = parts.next()?.trim().to_string();
            (!suffix.is_empty()).then_some(PublicRoute { method, suffix })
        })
        .collect()
}
