//! Tag repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use labelry_core::{Error, NewTag, Result, Tag, TagRepository, TagSource};

const TAG_COLUMNS: &str =
    "id, image_id, value, source, created_by_id, likelihood_score, created_at, updated_at";

/// PostgreSQL implementation of TagRepository.
#[derive(Clone)]
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn tag_from_row(row: &PgRow) -> Result<Tag> {
    let source: String = row.get("source");
    let source: TagSource = source
        .parse()
        .map_err(|_| Error::Internal(format!("unknown tag source in database: {}", source)))?;
    Ok(Tag {
        id: row.get("id"),
        image_id: row.get("image_id"),
        value: row.get("value"),
        source,
        created_by_id: row.get("created_by_id"),
        likelihood_score: row.get("likelihood_score"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn insert(&self, req: NewTag) -> Result<Tag> {
        let id = Uuid::now_v7();
        let now = Utc::now();
        let row = sqlx::query(&format!(
            "INSERT INTO tag (id, image_id, value, source, created_by_id, likelihood_score, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
             RETURNING {}",
            TAG_COLUMNS
        ))
        .bind(id)
        .bind(req.image_id)
        .bind(&req.value)
        .bind(req.source.as_str())
        .bind(req.created_by_id)
        .bind(req.likelihood_score)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        tag_from_row(&row)
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Tag>> {
        let row = sqlx::query(&format!("SELECT {} FROM tag WHERE id = $1", TAG_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.as_ref().map(tag_from_row).transpose()
    }

    async fn update_value(&self, id: Uuid, value: &str, source: TagSource) -> Result<Tag> {
        let row = sqlx::query(&format!(
            "UPDATE tag SET value = $2, source = $3, updated_at = $4 WHERE id = $1 RETURNING {}",
            TAG_COLUMNS
        ))
        .bind(id)
        .bind(value)
        .bind(source.as_str())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        match row {
            Some(row) => tag_from_row(&row),
            None => Err(Error::TagNotFound(id)),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Tag>> {
        let row = sqlx::query(&format!("DELETE FROM tag WHERE id = $1 RETURNING {}", TAG_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.as_ref().map(tag_from_row).transpose()
    }

    async fn count_for_image(&self, image_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tag WHERE image_id = $1")
            .bind(image_id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(count)
    }

    async fn list_for_image(&self, image_id: Uuid) -> Result<Vec<Tag>> {
        // UUIDv7 ids break ties within one timestamp
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tag WHERE image_id = $1 ORDER BY created_at DESC, id DESC",
            TAG_COLUMNS
        ))
        .bind(image_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(tag_from_row).collect()
    }
}
