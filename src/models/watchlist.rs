use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::MediaType;

/// Role of a member inside a watchlist.
///
/// Maps to the `member_role` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Owner,
    Editor,
    Viewer,
}

impl MemberRole {
    /// Owners and editors may add and remove items
    pub fn can_edit_items(&self) -> bool {
        matches!(self, MemberRole::Owner | MemberRole::Editor)
    }

    /// Only owners rename, delete and manage members
    pub fn can_manage(&self) -> bool {
        matches!(self, MemberRole::Owner)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Watchlist {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub invite_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A watchlist as shown in the caller's index
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WatchlistSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub watchlist: Watchlist,
    pub role: MemberRole,
    pub item_count: i64,
    pub member_count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct WatchlistMember {
    pub id: Uuid,
    pub watchlist_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

/// Member row joined with the member's profile
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MemberProfile {
    pub user_id: Uuid,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct WatchlistItem {
    pub id: Uuid,
    pub watchlist_id: Uuid,
    pub media_id: i64,
    pub media_type: MediaType,
    pub added_by: Uuid,
    pub added_at: DateTime<Utc>,
}

/// Watchlist item with the caller's favorite and watched flags
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ItemWithStatus {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub item: WatchlistItem,
    pub favorite: bool,
    pub watched: bool,
}

#[derive(Debug, Serialize)]
pub struct WatchlistDetail {
    #[serde(flatten)]
    pub watchlist: Watchlist,
    pub role: MemberRole,
    pub members: Vec<MemberProfile>,
    pub items: Vec<ItemWithStatus>,
}

/// Public view of a watchlist behind a join link
#[derive(Debug, Serialize)]
pub struct JoinPreview {
    pub id: Uuid,
    pub name: String,
    pub owner_name: String,
    pub already_member: bool,
}

#[derive(Debug, Serialize)]
pub struct JoinOutcome {
    pub watchlist_id: Uuid,
    pub role: MemberRole,
    pub already_member: bool,
}

// Request types

#[derive(Debug, Deserialize)]
pub struct CreateWatchlistRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateWatchlistRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub media_id: i64,
    pub media_type: MediaType,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemberRoleRequest {
    pub role: MemberRole,
}

/// Trims a free-text field, treating blank input as absent
pub fn normalize_optional(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}
