use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::MediaType;

/// Per-user flags, independent of any watchlist
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct PreferenceStatus {
    pub favorite: bool,
    pub watched: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceKind {
    Favorite,
    Watched,
}

impl PreferenceKind {
    pub fn table(&self) -> &'static str {
        match self {
            PreferenceKind::Favorite => "user_favorites",
            PreferenceKind::Watched => "user_watched",
        }
    }

    /// Column holding the time the flag was set
    pub fn timestamp_column(&self) -> &'static str {
        match self {
            PreferenceKind::Favorite => "added_at",
            PreferenceKind::Watched => "watched_at",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct PreferenceEntry {
    pub media_id: i64,
    pub media_type: MediaType,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ToggleOutcome {
    pub media_id: i64,
    pub media_type: MediaType,
    pub active: bool,
}
