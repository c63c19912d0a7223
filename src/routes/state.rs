use sqlx::PgPool;
use std::sync::Arc;

use crate::{
    config::Config,
    db::{
        FeedbackStore, PgFeedbackStore, PgPreferenceStore, PgUserStore, PgWatchlistStore,
        PreferenceStore, UserStore, WatchlistStore,
    },
    middleware::JwtVerifier,
    services::{catalog::Catalog, notifier::FeedbackNotifier},
};

/// Shared handler state. Every dependency sits behind a trait object.
#[derive(Clone)]
pub struct AppState {
    pub watchlists: Arc<dyn WatchlistStore>,
    pub preferences: Arc<dyn PreferenceStore>,
    pub feedback: Arc<dyn FeedbackStore>,
    pub users: Arc<dyn UserStore>,
    pub catalog: Arc<dyn Catalog>,
    pub notifier: Arc<dyn FeedbackNotifier>,
    pub auth: Arc<JwtVerifier>,
    pub login_path: Arc<str>,
}

impl AppState {
    /// Postgres-backed state
    pub fn new(
        pool: PgPool,
        catalog: Arc<dyn Catalog>,
        notifier: Arc<dyn FeedbackNotifier>,
        config: &Config,
    ) -> Self {
        Self {
            watchlists: Arc::new(PgWatchlistStore::new(pool.clone())),
            preferences: Arc::new(PgPreferenceStore::new(pool.clone())),
            feedback: Arc::new(PgFeedbackStore::new(pool.clone())),
            users: Arc::new(PgUserStore::new(pool)),
            catalog,
            notifier,
            auth: Arc::new(JwtVerifier::new(&config.jwt_secret, &config.jwt_audience)),
            login_path: Arc::from(config.login_path.as_str()),
        }
    }
}
