use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

const FALLBACK_NAME: &str = "User";

/// Profile mirrored from the identity provider
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identity asserted by a verified access token
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub id: Uuid,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

impl Identity {
    pub fn display_name(&self) -> String {
        display_name(self.name.as_deref(), self.email.as_deref())
    }
}

/// What clients render for a user: name, avatar or initials fallback
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProfileView {
    pub id: Uuid,
    pub email: Option<String>,
    pub display_name: String,
    pub initials: String,
    pub avatar_url: Option<String>,
}

impl ProfileView {
    pub fn new(
        id: Uuid,
        email: Option<String>,
        name: Option<&str>,
        avatar_url: Option<String>,
    ) -> Self {
        Self {
            id,
            display_name: display_name(name, email.as_deref()),
            initials: initials(name, email.as_deref()),
            avatar_url: avatar_url.filter(|a| !a.is_empty()),
            email,
        }
    }

    /// Stand-in for an id with no stored profile
    pub fn placeholder(id: Uuid) -> Self {
        Self::new(id, None, Some(FALLBACK_NAME), None)
    }
}

impl From<UserProfile> for ProfileView {
    fn from(profile: UserProfile) -> Self {
        ProfileView::new(
            profile.id,
            profile.email,
            profile.name.as_deref(),
            profile.avatar_url,
        )
    }
}

fn email_local_part(email: Option<&str>) -> Option<&str> {
    email
        .and_then(|e| e.split('@').next())
        .filter(|local| !local.is_empty())
}

/// Name, else the local part of the email, else a generic label
pub fn display_name(name: Option<&str>, email: Option<&str>) -> String {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .or_else(|| email_local_part(email))
        .unwrap_or(FALLBACK_NAME)
        .to_string()
}

/// Up to two uppercase initials for the avatar fallback
pub fn initials(name: Option<&str>, email: Option<&str>) -> String {
    let full_name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .or_else(|| email_local_part(email));

    let Some(full_name) = full_name else {
        return String::new();
    };

    let words: Vec<&str> = full_name.split_whitespace().collect();
    let letters: String = if words.len() >= 2 {
        [words[0], words[words.len() - 1]]
            .iter()
            .filter_map(|w| w.chars().next())
            .collect()
    } else {
        full_name.chars().take(2).collect()
    };

    letters.to_uppercase()
}
