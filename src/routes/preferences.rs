use axum::{
    extract::{Path, State},
    Json,
};

use super::AppState;
use crate::{
    error::AppResult,
    middleware::AuthUser,
    models::{MediaType, PreferenceEntry, PreferenceKind, PreferenceStatus, ToggleOutcome},
    services::preferences,
};

pub async fn status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((media_type, media_id)): Path<(MediaType, i64)>,
) -> AppResult<Json<PreferenceStatus>> {
    Ok(Json(
        preferences::status(state.preferences.as_ref(), user.id, media_id, media_type).await?,
    ))
}

pub async fn toggle_favorite(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((media_type, media_id)): Path<(MediaType, i64)>,
) -> AppResult<Json<ToggleOutcome>> {
    let outcome = preferences::toggle(
        state.preferences.as_ref(),
        PreferenceKind::Favorite,
        user.id,
        media_id,
        media_type,
    )
    .await?;
    Ok(Json(outcome))
}

pub async fn toggle_watched(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((media_type, media_id)): Path<(MediaType, i64)>,
) -> AppResult<Json<ToggleOutcome>> {
    let outcome = preferences::toggle(
        state.preferences.as_ref(),
        PreferenceKind::Watched,
        user.id,
        media_id,
        media_type,
    )
    .await?;
    Ok(Json(outcome))
}

pub async fn favorites(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<PreferenceEntry>>> {
    Ok(Json(
        preferences::list(state.preferences.as_ref(), PreferenceKind::Favorite, user.id).await?,
    ))
}

pub async fn watched(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<PreferenceEntry>>> {
    Ok(Json(
        preferences::list(state.preferences.as_ref(), PreferenceKind::Watched, user.id).await?,
    ))
}
