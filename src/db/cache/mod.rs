//! Read-through cache for catalog responses.
//!
//! Entries are JSON strings stored either in process memory or in Redis,
//! each with its own time-to-live.

mod macros;
pub mod memory;
pub mod redis;

use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Display;

use crate::error::{AppError, AppResult};
use crate::models::MediaType;

pub use self::memory::MemoryStore;
pub use self::redis::{create_redis_client, CacheWriterHandle, RedisStore};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Configuration,
    Search {
        query: String,
        page: u32,
        year: Option<String>,
        region: Option<String>,
    },
    Details(MediaType, i64),
    Genres(MediaType),
    Trending {
        scope: String,
        window: String,
    },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Configuration => write!(f, "tmdb:config"),
            CacheKey::Search {
                query,
                page,
                year,
                region,
            } => write!(
                f,
                "tmdb:search:{}:{}:{}:{}",
                query.trim().to_lowercase(),
                page,
                year.as_deref().unwrap_or("-"),
                region.as_deref().unwrap_or("-")
            ),
            CacheKey::Details(media_type, id) => write!(f, "tmdb:details:{}:{}", media_type, id),
            CacheKey::Genres(media_type) => write!(f, "tmdb:genres:{}", media_type),
            CacheKey::Trending { scope, window } => {
                write!(f, "tmdb:trending:{}:{}", scope, window)
            }
        }
    }
}

#[derive(Clone)]
enum Store {
    Memory(MemoryStore),
    Redis(RedisStore),
}

/// Cache handle shared by the catalog client
#[derive(Clone)]
pub struct Cache {
    store: Store,
}

impl Cache {
    /// Process-local cache; entries are dropped when they outlive their TTL
    pub fn in_memory() -> Self {
        Self {
            store: Store::Memory(MemoryStore::new()),
        }
    }

    /// Redis-backed cache with a background writer task
    pub async fn redis(client: ::redis::Client) -> AppResult<(Self, CacheWriterHandle)> {
        let (store, handle) = RedisStore::new(client).await?;
        Ok((
            Self {
                store: Store::Redis(store),
            },
            handle,
        ))
    }

    pub fn backend_name(&self) -> &'static str {
        match self.store {
            Store::Memory(_) => "memory",
            Store::Redis(_) => "redis",
        }
    }

    /// Retrieves a value from the cache by key
    ///
    /// Returns `None` when the key is absent or its entry has expired.
    pub async fn get_from_cache<T: DeserializeOwned>(&self, key: &CacheKey) -> AppResult<Option<T>> {
        let key = key.to_string();
        let cached = match &self.store {
            Store::Memory(store) => store.get(&key),
            Store::Redis(store) => store.get(&key).await?,
        };

        match cached {
            Some(json) => {
                let data = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                tracing::debug!(key = %key, "Cache hit");
                Ok(Some(data))
            }
            None => {
                tracing::debug!(key = %key, "Cache miss");
                Ok(None)
            }
        }
    }

    /// Stores a value without making the caller wait for the write
    pub fn set_in_background<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        match &self.store {
            Store::Memory(store) => store.set(key.to_string(), json, ttl),
            Store::Redis(store) => store.send(key.to_string(), json, ttl),
        }
    }
}
