//! Media catalog abstraction
//!
//! The catalog is the single source of movie and TV metadata. `TmdbCatalog`
//! talks to TMDb; handlers and the search controller only see the trait so
//! tests can swap in a mock.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::{
    error::AppResult,
    models::{CatalogConfig, Genre, MediaDetails, MediaType, SearchResults, Video},
};

pub mod tmdb;

pub use tmdb::TmdbCatalog;

pub const PLACEHOLDER_POSTER: &str = "/placeholder.svg";
pub const DEFAULT_POSTER_SIZE: &str = "w342";

/// Regions offered as search filters
pub const REGIONS: [(&str, &str); 10] = [
    ("US", "United States"),
    ("GB", "United Kingdom"),
    ("FR", "France"),
    ("DE", "Germany"),
    ("JP", "Japan"),
    ("KR", "South Korea"),
    ("IN", "India"),
    ("IT", "Italy"),
    ("ES", "Spain"),
    ("CN", "China"),
];

const EARLIEST_YEAR: i32 = 1900;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendingScope {
    All,
    #[default]
    Movie,
    Tv,
}

impl Display for TrendingScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TrendingScope::All => "all",
            TrendingScope::Movie => "movie",
            TrendingScope::Tv => "tv",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendingWindow {
    #[default]
    Day,
    Week,
}

impl Display for TrendingWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TrendingWindow::Day => "day",
            TrendingWindow::Week => "week",
        })
    }
}

/// Read-only access to movie and TV metadata
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    /// Image base URLs and available sizes
    async fn configuration(&self) -> AppResult<CatalogConfig>;

    /// Multi-search over movies and shows. People are never returned.
    async fn search_multi(
        &self,
        query: String,
        page: u32,
        year: Option<String>,
        region: Option<String>,
    ) -> AppResult<SearchResults>;

    /// Details with credits and videos
    async fn details(&self, media_type: MediaType, id: i64) -> AppResult<MediaDetails>;

    async fn genres(&self, media_type: MediaType) -> AppResult<Vec<Genre>>;

    async fn trending(&self, scope: TrendingScope, window: TrendingWindow)
        -> AppResult<SearchResults>;
}

/// Full poster URL for `path`, falling back to a placeholder or the raw path
pub fn poster_url(path: Option<&str>, config: &CatalogConfig, size: &str) -> String {
    let Some(path) = path.filter(|p| !p.is_empty()) else {
        return PLACEHOLDER_POSTER.to_string();
    };

    let images = &config.images;
    let Some(first_size) = images.poster_sizes.first() else {
        return path.to_string();
    };
    if images.secure_base_url.is_empty() {
        return path.to_string();
    }

    let size = if images.poster_sizes.iter().any(|s| s == size) {
        size
    } else {
        first_size.as_str()
    };

    format!("{}{}{}", images.secure_base_url, size, path)
}

pub fn youtube_embed_url(key: &str) -> String {
    format!("https://www.youtube.com/embed/{}?autoplay=0", key)
}

/// The official YouTube trailer if there is one, else any YouTube video
pub fn trailer(details: &MediaDetails) -> Option<&Video> {
    let mut youtube = details.videos.iter().filter(|v| v.site == "YouTube");
    youtube
        .clone()
        .find(|v| v.video_type == "Trailer")
        .or_else(|| youtube.next())
}

/// Details with the poster and trailer URLs a detail page embeds
#[derive(Debug, Serialize)]
pub struct DetailView {
    #[serde(flatten)]
    pub details: MediaDetails,
    pub poster_url: String,
    pub trailer_url: Option<String>,
}

impl DetailView {
    pub fn new(details: MediaDetails, config: &CatalogConfig) -> Self {
        Self {
            poster_url: poster_url(details.poster_path.as_deref(), config, DEFAULT_POSTER_SIZE),
            trailer_url: trailer(&details).map(|video| youtube_embed_url(&video.key)),
            details,
        }
    }
}

/// Movie and TV genres deduplicated by id and sorted by name
pub fn merged_genres(movie: Vec<Genre>, tv: Vec<Genre>) -> Vec<Genre> {
    let mut merged: Vec<Genre> = Vec::with_capacity(movie.len() + tv.len());
    for genre in movie.into_iter().chain(tv) {
        if !merged.iter().any(|g| g.id == genre.id) {
            merged.push(genre);
        }
    }
    merged.sort_by(|a, b| a.name.cmp(&b.name));
    merged
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Region {
    pub code: &'static str,
    pub name: &'static str,
}

/// Everything a client needs to render the search filter panel
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FilterOptions {
    pub genres: Vec<Genre>,
    pub years: Vec<i32>,
    pub regions: Vec<Region>,
}

pub fn filter_options(movie: Vec<Genre>, tv: Vec<Genre>, current_year: i32) -> FilterOptions {
    FilterOptions {
        genres: merged_genres(movie, tv),
        years: (EARLIEST_YEAR..=current_year).rev().collect(),
        regions: REGIONS
            .iter()
            .map(|&(code, name)| Region { code, name })
            .collect(),
    }
}
