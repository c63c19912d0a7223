use std::sync::Arc;

use cinecollab_api::{
    config::Config,
    db::{self, Cache, CacheWriterHandle},
    routes::{create_router, AppState},
    services::{
        catalog::{Catalog, TmdbCatalog},
        notifier::{FeedbackNotifier, LogNotifier, WebhookNotifier},
    },
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cinecollab_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;

    let (cache, cache_writer) = build_cache(&config).await?;
    tracing::info!(
        backend = cache.backend_name(),
        ttl_secs = config.catalog_cache_ttl_secs,
        "Catalog cache ready"
    );

    let catalog: Arc<dyn Catalog> = Arc::new(TmdbCatalog::new(
        cache,
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
        config.tmdb_language.clone(),
        config.catalog_cache_ttl_secs,
    ));

    let notifier: Arc<dyn FeedbackNotifier> = match &config.feedback_webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(
            url.clone(),
            config.feedback_webhook_token.clone(),
        )),
        None => {
            tracing::warn!("FEEDBACK_WEBHOOK_URL not set; feedback notifications are only logged");
            Arc::new(LogNotifier)
        }
    };

    let state = AppState::new(pool, catalog, notifier, &config);
    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_writer {
        handle.shutdown().await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

/// Redis when configured, process memory otherwise
async fn build_cache(config: &Config) -> anyhow::Result<(Cache, Option<CacheWriterHandle>)> {
    match &config.redis_url {
        Some(url) => {
            let client = db::create_redis_client(url)?;
            let (cache, handle) = Cache::redis(client).await?;
            Ok((cache, Some(handle)))
        }
        None => Ok((Cache::in_memory(), None)),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
