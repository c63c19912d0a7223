use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Datelike;
use serde::Deserialize;

use super::AppState;
use crate::{
    error::AppResult,
    models::{CatalogConfig, Genre, MediaType, SearchPage, SearchParams, SearchResults},
    services::{
        catalog::{filter_options, DetailView, FilterOptions, TrendingScope, TrendingWindow},
        search::search_page,
    },
};

#[derive(Debug, Deserialize)]
pub struct TrendingParams {
    #[serde(default)]
    scope: TrendingScope,
    #[serde(default)]
    window: TrendingWindow,
}

pub async fn configuration(State(state): State<AppState>) -> AppResult<Json<CatalogConfig>> {
    Ok(Json(state.catalog.configuration().await?))
}

pub async fn genres(
    State(state): State<AppState>,
    Path(media_type): Path<MediaType>,
) -> AppResult<Json<Vec<Genre>>> {
    Ok(Json(state.catalog.genres(media_type).await?))
}

/// Genres of both media types, selectable years and regions
pub async fn filters(State(state): State<AppState>) -> AppResult<Json<FilterOptions>> {
    let (movie, tv) = tokio::try_join!(
        state.catalog.genres(MediaType::Movie),
        state.catalog.genres(MediaType::Tv)
    )?;
    Ok(Json(filter_options(movie, tv, chrono::Utc::now().year())))
}

pub async fn details(
    State(state): State<AppState>,
    Path((media_type, id)): Path<(MediaType, i64)>,
) -> AppResult<Json<DetailView>> {
    let (details, config) = tokio::try_join!(
        state.catalog.details(media_type, id),
        state.catalog.configuration()
    )?;
    Ok(Json(DetailView::new(details, &config)))
}

pub async fn trending(
    State(state): State<AppState>,
    Query(params): Query<TrendingParams>,
) -> AppResult<Json<SearchResults>> {
    Ok(Json(state.catalog.trending(params.scope, params.window).await?))
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<SearchPage>> {
    let (filters, page) = params.into_filters();
    let results = search_page(state.catalog.as_ref(), &filters, page).await?;
    Ok(Json(results))
}
