/// Read-through caching around an async block.
///
/// Returns the cached value when present. Otherwise awaits `$block`, queues
/// the result for storage with the given TTL (seconds), and returns it.
/// A failed cache read is logged and treated as a miss. Errors from the
/// block propagate and nothing is cached.
///
/// # Example
/// ```rust,ignore
/// let genres: Vec<Genre> = cached!(self.cache, CacheKey::Genres(media_type), self.ttl, async move {
///     self.fetch_genres(media_type).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        let hit = match $cache.get_from_cache(&key).await {
            Ok(hit) => hit,
            Err(e) => {
                ::tracing::warn!(key = %key, error = %e, "Cache read failed");
                None
            }
        };
        match hit {
            Some(cached) => Ok(cached),
            None => match $block.await {
                Ok(value) => {
                    $cache.set_in_background(&key, &value, $ttl);
                    Ok(value)
                }
                Err(e) => Err(e),
            },
        }
    }};
}
