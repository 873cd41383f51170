//! Read access to user profiles.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use labelry_core::{Error, Result, UserProfileRepository};

/// PostgreSQL implementation of UserProfileRepository.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserProfileRepository for PgUserRepository {
    async fn likelihood_score(&self, user_id: Uuid) -> Result<Option<f64>> {
        let score: Option<Option<f64>> =
            sqlx::query_scalar("SELECT likelihood_score FROM app_user WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Database)?;
        Ok(score.flatten())
    }
}
