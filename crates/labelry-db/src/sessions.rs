//! Session token resolution.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use labelry_core::{Caller, Error, Result, SessionRepository};

/// PostgreSQL implementation of SessionRepository.
///
/// Only unexpired sessions resolve. The caller's admin flag is read from the
/// user row on every lookup, so revoking admin takes effect immediately.
#[derive(Clone)]
pub struct PgSessionRepository {
    pool: Pool<Postgres>,
}

impl PgSessionRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn resolve_caller(&self, token: &str) -> Result<Option<Caller>> {
        let row = sqlx::query(
            r#"
            SELECT s.user_id, u.admin
            FROM session s
            JOIN app_user u ON u.id = s.user_id
            WHERE s.token = $1 AND s.expires_at > now()
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|row| {
            let user_id: Uuid = row.get("user_id");
            Caller::new(user_id, row.get("admin"), token)
        }))
    }
}
