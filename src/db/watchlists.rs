use sqlx::PgPool;
use uuid::Uuid;

use super::conflict_on_unique;
use crate::{
    error::AppResult,
    models::{
        ItemWithStatus, MediaType, MemberProfile, MemberRole, Watchlist, WatchlistItem,
        WatchlistMember, WatchlistSummary,
    },
};

/// Persistence for watchlists, their members and their items
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait WatchlistStore: Send + Sync {
    /// Inserts the list and the owner's membership in one transaction
    async fn create_with_owner(
        &self,
        owner_id: Uuid,
        name: String,
        description: Option<String>,
        invite_code: String,
    ) -> AppResult<Watchlist>;

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<WatchlistSummary>>;

    async fn find(&self, id: Uuid) -> AppResult<Option<Watchlist>>;

    async fn update(
        &self,
        id: Uuid,
        name: String,
        description: Option<String>,
    ) -> AppResult<Watchlist>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;

    async fn member_role(&self, id: Uuid, user_id: Uuid) -> AppResult<Option<MemberRole>>;

    async fn members(&self, id: Uuid) -> AppResult<Vec<MemberProfile>>;

    async fn add_member(
        &self,
        id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> AppResult<WatchlistMember>;

    async fn set_member_role(&self, id: Uuid, user_id: Uuid, role: MemberRole) -> AppResult<bool>;

    async fn remove_member(&self, id: Uuid, user_id: Uuid) -> AppResult<bool>;

    /// Items with the viewer's favorite and watched flags
    async fn items(&self, id: Uuid, viewer_id: Uuid) -> AppResult<Vec<ItemWithStatus>>;

    async fn has_item(&self, id: Uuid, media_id: i64, media_type: MediaType) -> AppResult<bool>;

    async fn add_item(
        &self,
        id: Uuid,
        media_id: i64,
        media_type: MediaType,
        added_by: Uuid,
    ) -> AppResult<WatchlistItem>;

    async fn remove_item(&self, id: Uuid, media_id: i64, media_type: MediaType) -> AppResult<bool>;
}

pub struct PgWatchlistStore {
    pool: PgPool,
}

impl PgWatchlistStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const WATCHLIST_COLUMNS: &str =
    "id, owner_id, name, description, invite_code, created_at, updated_at";

#[async_trait::async_trait]
impl WatchlistStore for PgWatchlistStore {
    async fn create_with_owner(
        &self,
        owner_id: Uuid,
        name: String,
        description: Option<String>,
        invite_code: String,
    ) -> AppResult<Watchlist> {
        let mut tx = self.pool.begin().await?;

        let watchlist = sqlx::query_as::<_, Watchlist>(&format!(
            "INSERT INTO watchlists (owner_id, name, description, invite_code)
             VALUES ($1, $2, $3, $4)
             RETURNING {WATCHLIST_COLUMNS}"
        ))
        .bind(owner_id)
        .bind(&name)
        .bind(&description)
        .bind(&invite_code)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "Invite code already in use, please retry"))?;

        sqlx::query(
            "INSERT INTO watchlist_members (watchlist_id, user_id, role) VALUES ($1, $2, 'owner')",
        )
        .bind(watchlist.id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(watchlist)
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<WatchlistSummary>> {
        let rows = sqlx::query_as::<_, WatchlistSummary>(
            r#"
            SELECT w.id, w.owner_id, w.name, w.description, w.invite_code,
                   w.created_at, w.updated_at,
                   m.role,
                   (SELECT COUNT(*) FROM watchlist_movies i WHERE i.watchlist_id = w.id) AS item_count,
                   (SELECT COUNT(*) FROM watchlist_members x WHERE x.watchlist_id = w.id) AS member_count
            FROM watchlists w
            JOIN watchlist_members m ON m.watchlist_id = w.id
            WHERE m.user_id = $1
            ORDER BY w.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<Watchlist>> {
        let watchlist = sqlx::query_as::<_, Watchlist>(&format!(
            "SELECT {WATCHLIST_COLUMNS} FROM watchlists WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(watchlist)
    }

    async fn update(
        &self,
        id: Uuid,
        name: String,
        description: Option<String>,
    ) -> AppResult<Watchlist> {
        let watchlist = sqlx::query_as::<_, Watchlist>(&format!(
            "UPDATE watchlists SET name = $2, description = $3, updated_at = NOW()
             WHERE id = $1
             RETURNING {WATCHLIST_COLUMNS}"
        ))
        .bind(id)
        .bind(&name)
        .bind(&description)
        .fetch_one(&self.pool)
        .await?;

        Ok(watchlist)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM watchlists WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn member_role(&self, id: Uuid, user_id: Uuid) -> AppResult<Option<MemberRole>> {
        let role = sqlx::query_scalar::<_, MemberRole>(
            "SELECT role FROM watchlist_members WHERE watchlist_id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }

    async fn members(&self, id: Uuid) -> AppResult<Vec<MemberProfile>> {
        let members = sqlx::query_as::<_, MemberProfile>(
            r#"
            SELECT m.user_id, m.role, m.joined_at, u.email, u.name, u.avatar_url
            FROM watchlist_members m
            LEFT JOIN users u ON u.id = m.user_id
            WHERE m.watchlist_id = $1
            ORDER BY m.joined_at
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    async fn add_member(
        &self,
        id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> AppResult<WatchlistMember> {
        sqlx::query_as::<_, WatchlistMember>(
            r#"
            INSERT INTO watchlist_members (watchlist_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING id, watchlist_id, user_id, role, joined_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Already a member of this watchlist"))
    }

    async fn set_member_role(&self, id: Uuid, user_id: Uuid, role: MemberRole) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE watchlist_members SET role = $3 WHERE watchlist_id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .bind(role)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_member(&self, id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result =
            sqlx::query("DELETE FROM watchlist_members WHERE watchlist_id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn items(&self, id: Uuid, viewer_id: Uuid) -> AppResult<Vec<ItemWithStatus>> {
        let items = sqlx::query_as::<_, ItemWithStatus>(
            r#"
            SELECT i.id, i.watchlist_id, i.media_id, i.media_type, i.added_by, i.added_at,
                   EXISTS (
                       SELECT 1 FROM user_favorites f
                       WHERE f.user_id = $2 AND f.media_id = i.media_id AND f.media_type = i.media_type
                   ) AS favorite,
                   EXISTS (
                       SELECT 1 FROM user_watched w
                       WHERE w.user_id = $2 AND w.media_id = i.media_id AND w.media_type = i.media_type
                   ) AS watched
            FROM watchlist_movies i
            WHERE i.watchlist_id = $1
            ORDER BY i.added_at DESC
            "#,
        )
        .bind(id)
        .bind(viewer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn has_item(&self, id: Uuid, media_id: i64, media_type: MediaType) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM watchlist_movies
                WHERE watchlist_id = $1 AND media_id = $2 AND media_type = $3
            )
            "#,
        )
        .bind(id)
        .bind(media_id)
        .bind(media_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn add_item(
        &self,
        id: Uuid,
        media_id: i64,
        media_type: MediaType,
        added_by: Uuid,
    ) -> AppResult<WatchlistItem> {
        sqlx::query_as::<_, WatchlistItem>(
            r#"
            INSERT INTO watchlist_movies (watchlist_id, media_id, media_type, added_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, watchlist_id, media_id, media_type, added_by, added_at
            "#,
        )
        .bind(id)
        .bind(media_id)
        .bind(media_type)
        .bind(added_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, super::DUPLICATE_ITEM_MESSAGE))
    }

    async fn remove_item(&self, id: Uuid, media_id: i64, media_type: MediaType) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM watchlist_movies WHERE watchlist_id = $1 AND media_id = $2 AND media_type = $3",
        )
        .bind(id)
        .bind(media_id)
        .bind(media_type)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
