/// TMDb catalog client
///
/// Every response is memoized in the shared cache under a key built from the
/// endpoint and its parameters. The API key is never part of a key.
///
/// Endpoints:
/// - `/configuration` for image base URLs
/// - `/search/multi` for search (people are dropped)
/// - `/{movie|tv}/{id}?append_to_response=videos,credits` for details
/// - `/genre/{movie|tv}/list`
/// - `/trending/{scope}/{window}`
use reqwest::Client as HttpClient;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

use super::{Catalog, TrendingScope, TrendingWindow};
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{
        CatalogConfig, Genre, MediaDetails, MediaItem, MediaType, SearchResults, TmdbDetails,
    },
};

/// Drops the request URL, which carries the API key, from client errors
fn redact(err: reqwest::Error) -> AppError {
    AppError::HttpClient(err.without_url())
}

#[derive(Clone)]
pub struct TmdbCatalog {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    language: String,
    cache: Cache,
    ttl: u64,
}

/// Listing page before person entries are dropped
#[derive(Deserialize)]
struct RawPage {
    #[serde(default)]
    page: u32,
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    total_pages: u32,
    #[serde(default)]
    total_results: u32,
}

#[derive(Deserialize)]
struct GenreList {
    #[serde(default)]
    genres: Vec<Genre>,
}

impl TmdbCatalog {
    pub fn new(cache: Cache, api_key: String, api_url: String, language: String, ttl: u64) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            language,
            cache,
            ttl,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(redact)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDb API returned status {}: {}",
                status, body
            )));
        }

        response.json().await.map_err(redact)
    }

    /// Converts a raw listing page, keeping only movies and shows.
    ///
    /// Single-type listings may omit `media_type`; `fallback` fills it in.
    fn into_results(raw: RawPage, fallback: Option<MediaType>) -> SearchResults {
        let results = raw
            .results
            .into_iter()
            .filter_map(|mut value| {
                if let (Some(item), Some(media_type)) = (value.as_object_mut(), fallback) {
                    item.entry("media_type")
                        .or_insert_with(|| Value::String(media_type.to_string()));
                }
                match value["media_type"].as_str() {
                    Some("movie") | Some("tv") => serde_json::from_value::<MediaItem>(value)
                        .map_err(|e| tracing::warn!(error = %e, "Skipping malformed TMDb item"))
                        .ok(),
                    _ => None,
                }
            })
            .collect();

        SearchResults {
            page: raw.page,
            results,
            total_pages: raw.total_pages,
            total_results: raw.total_results,
        }
    }
}

#[async_trait::async_trait]
impl Catalog for TmdbCatalog {
    async fn configuration(&self) -> AppResult<CatalogConfig> {
        cached!(self.cache, CacheKey::Configuration, self.ttl, async move {
            self.get_json::<CatalogConfig>("/configuration", &[]).await
        })
    }

    async fn search_multi(
        &self,
        query: String,
        page: u32,
        year: Option<String>,
        region: Option<String>,
    ) -> AppResult<SearchResults> {
        let query = query.trim().to_string();
        if query.is_empty() {
            return Ok(SearchResults::empty());
        }

        let key = CacheKey::Search {
            query: query.clone(),
            page,
            year: year.clone(),
            region: region.clone(),
        };

        cached!(self.cache, key, self.ttl, async move {
            let page_param = page.to_string();
            let mut params = vec![
                ("query", query.as_str()),
                ("include_adult", "false"),
                ("language", self.language.as_str()),
                ("page", page_param.as_str()),
            ];
            if let Some(year) = year.as_deref() {
                params.push(("year", year));
            }
            if let Some(region) = region.as_deref() {
                params.push(("region", region));
            }

            let raw: RawPage = self.get_json("/search/multi", &params).await?;
            let results = Self::into_results(raw, None);

            tracing::info!(
                query = %query,
                page,
                results = results.results.len(),
                total_pages = results.total_pages,
                "TMDb search completed"
            );

            Ok(results)
        })
    }

    async fn details(&self, media_type: MediaType, id: i64) -> AppResult<MediaDetails> {
        cached!(self.cache, CacheKey::Details(media_type, id), self.ttl, async move {
            let path = format!("/{}/{}", media_type, id);
            let raw: TmdbDetails = self
                .get_json(&path, &[("append_to_response", "videos,credits")])
                .await?;
            Ok(raw.into_details(media_type))
        })
    }

    async fn genres(&self, media_type: MediaType) -> AppResult<Vec<Genre>> {
        cached!(self.cache, CacheKey::Genres(media_type), self.ttl, async move {
            let path = format!("/genre/{}/list", media_type);
            let list: GenreList = self.get_json(&path, &[]).await?;
            Ok(list.genres)
        })
    }

    async fn trending(
        &self,
        scope: TrendingScope,
        window: TrendingWindow,
    ) -> AppResult<SearchResults> {
        let key = CacheKey::Trending {
            scope: scope.to_string(),
            window: window.to_string(),
        };

        cached!(self.cache, key, self.ttl, async move {
            let path = format!("/trending/{}/{}", scope, window);
            let raw: RawPage = self.get_json(&path, &[]).await?;
            let fallback = match scope {
                TrendingScope::Movie => Some(MediaType::Movie),
                TrendingScope::Tv => Some(MediaType::Tv),
                TrendingScope::All => None,
            };
            Ok(Self::into_results(raw, fallback))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, response::IntoResponse};
    use httpmock::prelude::*;
    use serde_json::json;

    fn catalog_for(server: &MockServer) -> TmdbCatalog {
        TmdbCatalog::new(
            Cache::in_memory(),
            "test-key".to_string(),
            server.base_url(),
            "en-US".to_string(),
            600,
        )
    }

    #[tokio::test]
    async fn test_search_drops_people_and_sends_defaults() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/search/multi")
                .query_param("api_key", "test-key")
                .query_param("query", "dune")
                .query_param("include_adult", "false")
                .query_param("language", "en-US")
                .query_param("page", "1");
            then.status(200).json_body(json!({
                "page": 1,
                "total_pages": 3,
                "total_results": 42,
                "results": [
                    {"media_type": "movie", "id": 438631, "title": "Dune", "genre_ids": [878]},
                    {"media_type": "person", "id": 1190668, "name": "Timothée Chalamet"},
                    {"media_type": "tv", "id": 90228, "name": "Dune: Prophecy", "genre_ids": [10765]}
                ]
            }));
        });

        let catalog = catalog_for(&server);
        let results = catalog
            .search_multi("  dune ".to_string(), 1, None, None)
            .await
            .unwrap();

        mock.assert();
        assert_eq!(results.results.len(), 2);
        assert_eq!(results.total_pages, 3);
        assert_eq!(results.results[1].media_type(), MediaType::Tv);
    }

    #[tokio::test]
    async fn test_search_blank_query_skips_network() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/search/multi");
            then.status(200).json_body(json!({"page": 1, "results": []}));
        });

        let results = catalog_for(&server)
            .search_multi("   ".to_string(), 1, None, None)
            .await
            .unwrap();

        assert_eq!(results, SearchResults::empty());
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_repeated_requests_are_served_from_cache() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/genre/movie/list");
            then.status(200)
                .json_body(json!({"genres": [{"id": 28, "name": "Action"}]}));
        });

        let catalog = catalog_for(&server);
        let first = catalog.genres(MediaType::Movie).await.unwrap();
        let second = catalog.genres(MediaType::Movie).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0].name, "Action");
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_details_appends_videos_and_credits() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/tv/1396")
                .query_param("append_to_response", "videos,credits");
            then.status(200).json_body(json!({
                "id": 1396,
                "name": "Breaking Bad",
                "first_air_date": "2008-01-20",
                "vote_average": 8.9,
                "genres": [{"id": 18, "name": "Drama"}],
                "credits": {"cast": [{"id": 17419, "name": "Bryan Cranston", "character": "Walter White"}], "crew": []},
                "videos": {"results": [{"id": "v1", "key": "HhesaQXLuRY", "name": "Trailer", "site": "YouTube", "type": "Trailer"}]}
            }));
        });

        let details = catalog_for(&server)
            .details(MediaType::Tv, 1396)
            .await
            .unwrap();

        mock.assert();
        assert_eq!(details.title, "Breaking Bad");
        assert_eq!(details.release_date.as_deref(), Some("2008-01-20"));
        assert_eq!(details.credits.cast.len(), 1);
        assert_eq!(details.videos[0].key, "HhesaQXLuRY");
    }

    #[tokio::test]
    async fn test_trending_fills_missing_media_type() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/trending/movie/week");
            then.status(200).json_body(json!({
                "page": 1,
                "total_pages": 1,
                "total_results": 1,
                "results": [{"id": 550, "title": "Fight Club"}]
            }));
        });

        let results = catalog_for(&server)
            .trending(TrendingScope::Movie, TrendingWindow::Week)
            .await
            .unwrap();

        assert_eq!(results.results.len(), 1);
        assert_eq!(results.results[0].title(), "Fight Club");
    }

    #[tokio::test]
    async fn test_unreachable_api_does_not_leak_key() {
        let catalog = TmdbCatalog::new(
            Cache::in_memory(),
            "SECRET-KEY-123".to_string(),
            "http://127.0.0.1:9".to_string(),
            "en-US".to_string(),
            600,
        );

        let err = catalog
            .search_multi("dune".to_string(), 1, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::HttpClient(_)));
        assert!(!err.to_string().contains("SECRET-KEY-123"));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8_lossy(&bytes);
        assert!(!body.contains("SECRET-KEY-123"));
        assert!(!body.contains("api_key"));
    }

    #[tokio::test]
    async fn test_error_status_maps_to_external_api() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/configuration");
            then.status(401).body("Invalid API key");
        });

        let err = catalog_for(&server).configuration().await.unwrap_err();
        match err {
            AppError::ExternalApi(msg) => {
                assert!(msg.contains("401"));
                assert!(msg.contains("Invalid API key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
