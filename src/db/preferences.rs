use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{MediaType, PreferenceEntry, PreferenceKind, PreferenceStatus},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Flips the flag and returns whether it is now set
    async fn toggle(
        &self,
        kind: PreferenceKind,
        user_id: Uuid,
        media_id: i64,
        media_type: MediaType,
    ) -> AppResult<bool>;

    async fn status(
        &self,
        user_id: Uuid,
        media_id: i64,
        media_type: MediaType,
    ) -> AppResult<PreferenceStatus>;

    async fn list(&self, kind: PreferenceKind, user_id: Uuid) -> AppResult<Vec<PreferenceEntry>>;
}

pub struct PgPreferenceStore {
    pool: PgPool,
}

impl PgPreferenceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PreferenceStore for PgPreferenceStore {
    async fn toggle(
        &self,
        kind: PreferenceKind,
        user_id: Uuid,
        media_id: i64,
        media_type: MediaType,
    ) -> AppResult<bool> {
        // Delete and insert in one statement so concurrent toggles cannot
        // leave both a removal and an insertion behind.
        let table = kind.table();
        let active = sqlx::query_scalar::<_, bool>(&format!(
            r#"
            WITH removed AS (
                DELETE FROM {table}
                WHERE user_id = $1 AND media_id = $2 AND media_type = $3
                RETURNING 1
            ), inserted AS (
                INSERT INTO {table} (user_id, media_id, media_type)
                SELECT $1, $2, $3
                WHERE NOT EXISTS (SELECT 1 FROM removed)
                ON CONFLICT DO NOTHING
                RETURNING 1
            )
            SELECT EXISTS (SELECT 1 FROM inserted)
            "#
        ))
        .bind(user_id)
        .bind(media_id)
        .bind(media_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(active)
    }

    async fn status(
        &self,
        user_id: Uuid,
        media_id: i64,
        media_type: MediaType,
    ) -> AppResult<PreferenceStatus> {
        let (favorite, watched) = sqlx::query_as::<_, (bool, bool)>(
            r#"
            SELECT
                EXISTS (SELECT 1 FROM user_favorites
                        WHERE user_id = $1 AND media_id = $2 AND media_type = $3),
                EXISTS (SELECT 1 FROM user_watched
                        WHERE user_id = $1 AND media_id = $2 AND media_type = $3)
            "#,
        )
        .bind(user_id)
        .bind(media_id)
        .bind(media_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(PreferenceStatus { favorite, watched })
    }

    async fn list(&self, kind: PreferenceKind, user_id: Uuid) -> AppResult<Vec<PreferenceEntry>> {
        let table = kind.table();
        let column = kind.timestamp_column();
        let entries = sqlx::query_as::<_, PreferenceEntry>(&format!(
            "SELECT media_id, media_type, {column} AS added_at
             FROM {table}
             WHERE user_id = $1
             ORDER BY {column} DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
