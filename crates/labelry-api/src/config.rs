//! Server configuration loaded from the environment.

use std::time::Duration;

use labelry_core::DEFAULT_MAX_TAG_LENGTH;
use labelry_db::PoolConfig;

/// Default request body limit in bytes.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Default capacity of the scoring notification queue.
pub const DEFAULT_SCORING_QUEUE_CAPACITY: usize = 256;

/// Default per-delivery timeout for scoring notifications.
pub const DEFAULT_SCORING_TIMEOUT_SECS: u64 = 10;

/// Runtime configuration for the API server.
///
/// | Variable | Default |
/// |----------|---------|
/// | `DATABASE_URL` | `postgres://localhost/labelry` |
/// | `HOST` / `PORT` | `0.0.0.0` / `3000` |
/// | `DB_MAX_CONNECTIONS` | `10` |
/// | `DB_MIN_CONNECTIONS` | `1` |
/// | `DB_ACQUIRE_TIMEOUT_SECS` | `30` |
/// | `SCORING_API_URL` | unset (notifications disabled) |
/// | `SCORING_QUEUE_CAPACITY` | `256` |
/// | `SCORING_TIMEOUT_SECS` | `10` |
/// | `MAX_TAG_LENGTH` | `32` |
/// | `CORS_ALLOWED_ORIGINS` | unset (no cross-origin access) |
/// | `MAX_BODY_BYTES` | `65536` |
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout: Duration,
    pub scoring_api_url: Option<String>,
    pub scoring_queue_capacity: usize,
    pub scoring_timeout: Duration,
    pub max_tag_length: usize,
    pub cors_allowed_origins: Vec<String>,
    pub max_body_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl ApiConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let scoring_api_url = lookup("SCORING_API_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "postgres://localhost/labelry".to_string()),
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 3000),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10),
            db_min_connections: parse_or(&lookup, "DB_MIN_CONNECTIONS", 1),
            db_acquire_timeout: Duration::from_secs(parse_or(
                &lookup,
                "DB_ACQUIRE_TIMEOUT_SECS",
                30,
            )),
            scoring_api_url,
            scoring_queue_capacity: parse_or(
                &lookup,
                "SCORING_QUEUE_CAPACITY",
                DEFAULT_SCORING_QUEUE_CAPACITY,
            )
            .max(1),
            scoring_timeout: Duration::from_secs(parse_or(
                &lookup,
                "SCORING_TIMEOUT_SECS",
                DEFAULT_SCORING_TIMEOUT_SECS,
            )),
            max_tag_length: parse_or(&lookup, "MAX_TAG_LENGTH", DEFAULT_MAX_TAG_LENGTH).max(1),
            cors_allowed_origins,
            max_body_bytes: parse_or(&lookup, "MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES),
        }
    }

    /// Pool settings for the store connection.
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::new()
            .max_connections(self.db_max_connections)
            .min_connections(self.db_min_connections)
            .acquire_timeout(self.db_acquire_timeout)
    }

    /// `host:port` string for binding the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(
                    subsystem = "api",
                    component = "config",
                    key,
                    value = %raw,
                    "Invalid configuration value, using default"
                );
                default
            }
        },
        None => default,
    }
}
