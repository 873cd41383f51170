//! # labelry-db
//!
//! PostgreSQL database layer for labelry.
//!
//! This crate provides the repository implementations behind the
//! [`LabelingEngine`](labelry_core::LabelingEngine):
//! - images and their derived status
//! - tags
//! - AI-assist usage markers
//! - read-only user profiles and sessions

pub mod images;
pub mod labeler_usage;
pub mod pool;
pub mod sessions;
pub mod tags;
pub mod test_fixtures;
pub mod users;

use std::sync::Arc;

pub use images::PgImageRepository;
pub use labeler_usage::PgLabelerUsageRepository;
pub use pool::{connect_pool, log_pool_metrics, PoolConfig};
pub use sessions::PgSessionRepository;
pub use tags::PgTagRepository;
pub use users::PgUserRepository;

// Re-export core types for convenience
pub use labelry_core::*;

/// Database handle bundling every repository over one pool.
#[derive(Clone)]
pub struct Database {
    pool: sqlx::Pool<sqlx::Postgres>,
    pub images: PgImageRepository,
    pub tags: PgTagRepository,
    pub labeler_usage: PgLabelerUsageRepository,
    pub users: PgUserRepository,
    pub sessions: PgSessionRepository,
}

impl Database {
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            images: PgImageRepository::new(pool.clone()),
            tags: PgTagRepository::new(pool.clone()),
            labeler_usage: PgLabelerUsageRepository::new(pool.clone()),
            users: PgUserRepository::new(pool.clone()),
            sessions: PgSessionRepository::new(pool.clone()),
            pool,
        }
    }

    /// Open a pool and build the repositories over it.
    pub async fn connect(url: &str, config: &PoolConfig) -> Result<Self> {
        let pool = connect_pool(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Round-trip a trivial query; used by the health endpoint.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    /// Build a workflow engine over this database's repositories.
    pub fn engine(&self, notifier: Arc<dyn ScoringNotifier>) -> LabelingEngine {
        LabelingEngine::new(
            Arc::new(self.images.clone()),
            Arc::new(self.tags.clone()),
            Arc::new(self.labeler_usage.clone()),
            Arc::new(self.users.clone()),
            notifier,
        )
    }
}
