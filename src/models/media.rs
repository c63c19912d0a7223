use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Kind of catalog entry a watchlist or preference row points at.
///
/// Maps to the `media_type` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "media_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }
}

impl Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(MediaType::Movie),
            "tv" => Ok(MediaType::Tv),
            other => Err(format!("Unknown media type: {}", other)),
        }
    }
}

// ============================================================================
// TMDb API Types
// ============================================================================

/// Image configuration returned by `/configuration`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogConfig {
    pub images: ImageConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImageConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub secure_base_url: String,
    #[serde(default)]
    pub backdrop_sizes: Vec<String>,
    #[serde(default)]
    pub logo_sizes: Vec<String>,
    #[serde(default)]
    pub poster_sizes: Vec<String>,
    #[serde(default)]
    pub profile_sizes: Vec<String>,
    #[serde(default)]
    pub still_sizes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
    #[serde(default)]
    pub vote_average: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TvShow {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
    #[serde(default)]
    pub vote_average: f64,
}

/// A movie or TV show as returned by search and trending listings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "media_type", rename_all = "lowercase")]
pub enum MediaItem {
    Movie(Movie),
    Tv(TvShow),
}

impl MediaItem {
    pub fn id(&self) -> i64 {
        match self {
            MediaItem::Movie(m) => m.id,
            MediaItem::Tv(t) => t.id,
        }
    }

    pub fn media_type(&self) -> MediaType {
        match self {
            MediaItem::Movie(_) => MediaType::Movie,
            MediaItem::Tv(_) => MediaType::Tv,
        }
    }

    /// `title` for movies, `name` for shows
    pub fn title(&self) -> &str {
        match self {
            MediaItem::Movie(m) => &m.title,
            MediaItem::Tv(t) => &t.name,
        }
    }

    /// `release_date` for movies, `first_air_date` for shows
    pub fn release_date(&self) -> Option<&str> {
        match self {
            MediaItem::Movie(m) => m.release_date.as_deref(),
            MediaItem::Tv(t) => t.first_air_date.as_deref(),
        }
        .filter(|d| !d.is_empty())
    }

    pub fn genre_ids(&self) -> &[i64] {
        match self {
            MediaItem::Movie(m) => &m.genre_ids,
            MediaItem::Tv(t) => &t.genre_ids,
        }
    }

    pub fn poster_path(&self) -> Option<&str> {
        match self {
            MediaItem::Movie(m) => m.poster_path.as_deref(),
            MediaItem::Tv(t) => t.poster_path.as_deref(),
        }
    }

    /// True when the item shares at least one genre with `genres`
    pub fn matches_any_genre(&self, genres: &[i64]) -> bool {
        self.genre_ids().iter().any(|g| genres.contains(g))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResults {
    pub page: u32,
    pub results: Vec<MediaItem>,
    pub total_pages: u32,
    pub total_results: u32,
}

impl SearchResults {
    pub fn empty() -> Self {
        Self {
            page: 0,
            results: Vec::new(),
            total_pages: 0,
            total_results: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Video {
    pub id: String,
    pub key: String,
    pub name: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CastMember {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrewMember {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub job: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

/// Per-title details with credits and videos appended
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaDetails {
    pub media_type: MediaType,
    pub id: i64,
    pub title: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub overview: String,
    pub release_date: Option<String>,
    pub genres: Vec<Genre>,
    pub vote_average: f64,
    pub credits: Credits,
    pub videos: Vec<Video>,
}

/// Raw `/movie/{id}` or `/tv/{id}` response
#[derive(Debug, Deserialize)]
pub struct TmdbDetails {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub credits: Option<Credits>,
    #[serde(default)]
    pub videos: Option<TmdbVideoList>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbVideoList {
    #[serde(default)]
    pub results: Vec<Video>,
}

impl TmdbDetails {
    pub fn into_details(self, media_type: MediaType) -> MediaDetails {
        let (title, release_date) = match media_type {
            MediaType::Movie => (self.title.or(self.name), self.release_date),
            MediaType::Tv => (self.name.or(self.title), self.first_air_date),
        };

        MediaDetails {
            media_type,
            id: self.id,
            title: title.unwrap_or_default(),
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            overview: self.overview.unwrap_or_default(),
            release_date: release_date.filter(|d| !d.is_empty()),
            genres: self.genres,
            vote_average: self.vote_average,
            credits: self.credits.unwrap_or_default(),
            videos: self.videos.map(|v| v.results).unwrap_or_default(),
        }
    }
}
