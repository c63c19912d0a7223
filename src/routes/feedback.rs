use axum::{extract::State, http::StatusCode, Json};

use super::AppState;
use crate::{
    error::AppResult,
    middleware::AuthUser,
    models::{Feedback, SubmitFeedbackRequest},
    services::feedback,
};

pub async fn submit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<SubmitFeedbackRequest>,
) -> AppResult<(StatusCode, Json<Feedback>)> {
    let stored = feedback::submit(
        state.feedback.as_ref(),
        state.notifier.clone(),
        &user,
        request,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn list_mine(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<Feedback>>> {
    Ok(Json(feedback::list_mine(state.feedback.as_ref(), &user).await?))
}
