//! PostgreSQL pool setup and pool health logging.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info, warn};

use labelry_core::logging::SUBSYSTEM_DB;
use labelry_core::{Error, Result};

/// Sizing and acquire behaviour for the labelry pool.
///
/// Every tag write is followed by an image status write on a separate
/// connection checkout, so the pool should stay comfortably above the
/// number of concurrent requests expected per image group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long a repository call waits for a free connection.
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

impl PoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_connections(mut self, n: u32) -> Self {
        self.max_connections = n.max(1);
        self
    }

    pub fn min_connections(mut self, n: u32) -> Self {
        self.min_connections = n;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Warm connection count, never above the pool size.
    pub fn effective_min_connections(&self) -> u32 {
        self.min_connections.min(self.max_connections)
    }
}

/// Open a pool against `database_url`.
pub async fn connect_pool(database_url: &str, config: &PoolConfig) -> Result<PgPool> {
    let start = Instant::now();
    let min_connections = config.effective_min_connections();
    if min_connections < config.min_connections {
        warn!(
            subsystem = SUBSYSTEM_DB,
            component = "pool",
            requested = config.min_connections,
            max_connections = config.max_connections,
            "Minimum connections exceed pool size, clamping"
        );
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(min_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(database_url)
        .await
        .map_err(Error::Database)?;

    info!(
        subsystem = SUBSYSTEM_DB,
        component = "pool",
        op = "connect",
        max_connections = config.max_connections,
        min_connections,
        acquire_timeout_secs = config.acquire_timeout.as_secs(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Database pool ready"
    );
    Ok(pool)
}

/// Log pool occupancy; warns when every connection is checked out.
pub fn log_pool_metrics(pool: &PgPool) {
    let size = pool.size();
    let idle = pool.num_idle();
    debug!(
        subsystem = SUBSYSTEM_DB,
        component = "pool",
        op = "metrics",
        pool_size = size,
        pool_idle = idle,
        "Pool occupancy"
    );
    if size > 0 && idle == 0 {
        warn!(
            subsystem = SUBSYSTEM_DB,
            component = "pool",
            pool_size = size,
            "All pooled connections are in use"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_config_builder() {
        let config = PoolConfig::new()
            .max_connections(20)
            .min_connections(4)
            .acquire_timeout(Duration::from_secs(5));
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.effective_min_connections(), 4);
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_min_connections_clamped_to_pool_size() {
        let config = PoolConfig::new().max_connections(2).min_connections(8);
        assert_eq!(config.effective_min_connections(), 2);
    }

    #[test]
    fn test_zero_pool_size_rounds_up() {
        assert_eq!(PoolConfig::new().max_connections(0).max_connections, 1);
    }
}
