//! AI-assist usage markers.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use labelry_core::{Error, LabelerUsage, LabelerUsageRepository, Result};

/// PostgreSQL implementation of LabelerUsageRepository.
///
/// The `(user_id, image_id)` unique constraint is the only guard against
/// duplicate markers; concurrent inserts for the same pair resolve to one
/// row and a [`Error::Conflict`] for every loser.
#[derive(Clone)]
pub struct PgLabelerUsageRepository {
    pool: Pool<Postgres>,
}

impl PgLabelerUsageRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LabelerUsageRepository for PgLabelerUsageRepository {
    async fn exists(&self, user_id: Uuid, image_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM labeler_usage WHERE user_id = $1 AND image_id = $2)",
        )
        .bind(user_id)
        .bind(image_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(exists)
    }

    async fn insert(&self, user_id: Uuid, image_id: Uuid) -> Result<LabelerUsage> {
        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO labeler_usage (id, user_id, image_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            ON CONFLICT (user_id, image_id) DO NOTHING
            RETURNING id, user_id, image_id, created_at, updated_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(image_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        let row = row.ok_or_else(|| {
            Error::Conflict(format!(
                "labeler usage already exists for user {} and image {}",
                user_id, image_id
            ))
        })?;

        Ok(LabelerUsage {
            id: row.get("id"),
            user_id: row.get("user_id"),
            image_id: row.get("image_id"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}
