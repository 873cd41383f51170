//! Image repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use labelry_core::{
    Error, Image, ImageRepository, ImageStatus, NewImage, Result, StatusCounts,
};

const IMAGE_COLUMNS: &str =
    "id, group_id, filename, original_name, url, status, created_at, updated_at";

/// PostgreSQL implementation of ImageRepository.
#[derive(Clone)]
pub struct PgImageRepository {
    pool: Pool<Postgres>,
}

impl PgImageRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

pub(crate) fn parse_status(raw: &str) -> Result<ImageStatus> {
    raw.parse()
        .map_err(|_| Error::Internal(format!("unknown image status in database: {}", raw)))
}

fn image_from_row(row: &PgRow) -> Result<Image> {
    let status: String = row.get("status");
    Ok(Image {
        id: row.get("id"),
        group_id: row.get("group_id"),
        filename: row.get("filename"),
        original_name: row.get("original_name"),
        url: row.get("url"),
        status: parse_status(&status)?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl ImageRepository for PgImageRepository {
    async fn insert(&self, req: NewImage) -> Result<Image> {
        let id = Uuid::now_v7();
        let now = Utc::now();
        let row = sqlx::query(&format!(
            "INSERT INTO image (id, group_id, filename, original_name, url, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
             RETURNING {}",
            IMAGE_COLUMNS
        ))
        .bind(id)
        .bind(req.group_id)
        .bind(&req.filename)
        .bind(&req.original_name)
        .bind(&req.url)
        .bind(ImageStatus::Unlabeled.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        image_from_row(&row)
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Image>> {
        let row = sqlx::query(&format!("SELECT {} FROM image WHERE id = $1", IMAGE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.as_ref().map(image_from_row).transpose()
    }

    async fn set_status(&self, id: Uuid, status: ImageStatus) -> Result<Image> {
        let row = sqlx::query(&format!(
            "UPDATE image SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {}",
            IMAGE_COLUMNS
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        match row {
            Some(row) => image_from_row(&row),
            None => Err(Error::ImageNotFound(id)),
        }
    }

    async fn status_counts(&self, group_id: Option<Uuid>) -> Result<StatusCounts> {
        let rows = sqlx::query(
            r#"
            SELECT status, COUNT(*) AS n
            FROM image
            WHERE $1::uuid IS NULL OR group_id = $1
            GROUP BY status
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut counts = StatusCounts::default();
        for row in rows {
            let status: String = row.get("status");
            counts.add(parse_status(&status)?, row.get::<i64, _>("n"));
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_accepts_stored_values() {
        for status in ImageStatus::ALL {
            assert_eq!(parse_status(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn test_parse_status_rejects_garbage() {
        assert!(matches!(parse_status("ARCHIVED"), Err(Error::Internal(_))));
    }
}
