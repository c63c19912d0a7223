use axum::{
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{make_span_with_request_id, request_id_middleware};

pub mod catalog;
pub mod feedback;
pub mod preferences;
pub mod state;
pub mod users;
pub mod watchlists;

pub use state::AppState;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .route("/catalog/configuration", get(catalog::configuration))
        .route("/catalog/filters", get(catalog::filters))
        .route("/catalog/genres/:media_type", get(catalog::genres))
        .route("/catalog/:media_type/:id", get(catalog::details))
        .route("/trending", get(catalog::trending))
        .route("/search", get(catalog::search))
        // Watchlists
        .route("/watchlists", get(watchlists::list).post(watchlists::create))
        .route(
            "/watchlists/:id",
            get(watchlists::get)
                .patch(watchlists::update)
                .delete(watchlists::delete),
        )
        .route(
            "/watchlists/:id/items",
            get(watchlists::items).post(watchlists::add_item),
        )
        .route(
            "/watchlists/:id/items/:media_type/:media_id",
            delete(watchlists::remove_item),
        )
        .route("/watchlists/:id/random", get(watchlists::random))
        .route("/watchlists/:id/join", post(watchlists::join))
        .route("/watchlists/:id/members/me", delete(watchlists::leave))
        .route(
            "/watchlists/:id/members/:user_id",
            patch(watchlists::set_member_role).delete(watchlists::remove_member),
        )
        .route("/join/:id", get(watchlists::join_preview))
        // Preferences
        .route("/preferences/favorites", get(preferences::favorites))
        .route("/preferences/watched", get(preferences::watched))
        .route(
            "/preferences/:media_type/:media_id",
            get(preferences::status),
        )
        .route(
            "/preferences/:media_type/:media_id/favorite",
            post(preferences::toggle_favorite),
        )
        .route(
            "/preferences/:media_type/:media_id/watched",
            post(preferences::toggle_watched),
        )
        // Feedback and profiles
        .route("/feedback", get(feedback::list_mine).post(feedback::submit))
        .route("/me", get(users::me))
        .route("/users/:id", get(users::profile))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
