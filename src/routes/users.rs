use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use super::AppState;
use crate::{error::AppResult, middleware::AuthUser, models::ProfileView, services::users};

/// Profile of the caller, straight from the verified token
pub async fn me(AuthUser(user): AuthUser) -> Json<ProfileView> {
    Json(ProfileView::new(
        user.id,
        user.email,
        user.name.as_deref(),
        user.avatar_url,
    ))
}

pub async fn profile(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ProfileView>> {
    Ok(Json(users::profile(state.users.as_ref(), id).await?))
}
