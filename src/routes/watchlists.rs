use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use uuid::Uuid;

use super::AppState;
use crate::{
    error::AppResult,
    middleware::{AuthUser, MaybeUser},
    models::{
        AddItemRequest, CreateWatchlistRequest, ItemWithStatus, JoinOutcome, MediaType,
        UpdateMemberRoleRequest, UpdateWatchlistRequest, Watchlist, WatchlistDetail,
        WatchlistItem, WatchlistSummary,
    },
    services::{picker::RandomPick, watchlists},
};

pub async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<WatchlistSummary>>> {
    let lists = watchlists::list_for_user(state.watchlists.as_ref(), user.id).await?;
    Ok(Json(lists))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateWatchlistRequest>,
) -> AppResult<(StatusCode, Json<Watchlist>)> {
    let watchlist = watchlists::create(state.watchlists.as_ref(), user.id, request).await?;
    Ok((StatusCode::CREATED, Json(watchlist)))
}

pub async fn get(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<WatchlistDetail>> {
    Ok(Json(
        watchlists::get(state.watchlists.as_ref(), id, user.id).await?,
    ))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateWatchlistRequest>,
) -> AppResult<Json<Watchlist>> {
    Ok(Json(
        watchlists::update(state.watchlists.as_ref(), id, user.id, request).await?,
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    watchlists::delete(state.watchlists.as_ref(), id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn items(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<ItemWithStatus>>> {
    Ok(Json(
        watchlists::list_items(state.watchlists.as_ref(), id, user.id).await?,
    ))
}

pub async fn add_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<AddItemRequest>,
) -> AppResult<(StatusCode, Json<WatchlistItem>)> {
    let item = watchlists::add_item(state.watchlists.as_ref(), id, user.id, request).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn remove_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((id, media_type, media_id)): Path<(Uuid, MediaType, i64)>,
) -> AppResult<StatusCode> {
    watchlists::remove_item(state.watchlists.as_ref(), id, user.id, media_id, media_type).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn random(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RandomPick>> {
    let pick = watchlists::random_pick(
        state.watchlists.as_ref(),
        state.catalog.as_ref(),
        id,
        user.id,
    )
    .await?;
    Ok(Json(pick))
}

pub async fn join(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<JoinOutcome>> {
    Ok(Json(
        watchlists::join(state.watchlists.as_ref(), id, user.id).await?,
    ))
}

/// Join link target. Guests are sent to sign in first.
pub async fn join_preview(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let Some(user) = user else {
        let location = watchlists::login_redirect(&state.login_path, id);
        return Ok(Redirect::to(&location).into_response());
    };

    let preview = watchlists::join_preview(
        state.watchlists.as_ref(),
        state.users.as_ref(),
        id,
        user.id,
    )
    .await?;
    Ok(Json(preview).into_response())
}

pub async fn leave(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    watchlists::leave(state.watchlists.as_ref(), id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_member_role(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((id, member_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateMemberRoleRequest>,
) -> AppResult<StatusCode> {
    watchlists::set_member_role(
        state.watchlists.as_ref(),
        id,
        user.id,
        member_id,
        request.role,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_member(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((id, member_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    watchlists::remove_member(state.watchlists.as_ref(), id, user.id, member_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
