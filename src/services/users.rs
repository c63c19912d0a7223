use uuid::Uuid;

use crate::{db::UserStore, error::AppResult, models::ProfileView};

/// Public profile of `id`; unknown users get a placeholder
pub async fn profile(store: &dyn UserStore, id: Uuid) -> AppResult<ProfileView> {
    Ok(match store.find(id).await? {
        Some(profile) => ProfileView::from(profile),
        None => ProfileView::placeholder(id),
    })
}
