use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Identity, UserProfile},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Creates or refreshes the local mirror of a token identity
    async fn upsert(&self, identity: Identity) -> AppResult<UserProfile>;

    async fn find(&self, id: Uuid) -> AppResult<Option<UserProfile>>;
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserStore for PgUserStore {
    async fn upsert(&self, identity: Identity) -> AppResult<UserProfile> {
        // Claims without a name or avatar keep whatever was stored before
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO users (id, email, name, avatar_url)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                email = COALESCE(EXCLUDED.email, users.email),
                name = COALESCE(EXCLUDED.name, users.name),
                avatar_url = COALESCE(EXCLUDED.avatar_url, users.avatar_url),
                updated_at = NOW()
            RETURNING id, email, name, avatar_url, created_at, updated_at
            "#,
        )
        .bind(identity.id)
        .bind(&identity.email)
        .bind(&identity.name)
        .bind(&identity.avatar_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(
            "SELECT id, email, name, avatar_url, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }
}
