pub mod cache;
pub mod feedback;
pub mod postgres;
pub mod preferences;
pub mod users;
pub mod watchlists;

pub use cache::{create_redis_client, Cache, CacheKey, CacheWriterHandle};
pub use feedback::{FeedbackStore, PgFeedbackStore};
pub use postgres::{create_pool, run_migrations};
pub use preferences::{PgPreferenceStore, PreferenceStore};
pub use users::{PgUserStore, UserStore};
pub use watchlists::{PgWatchlistStore, WatchlistStore};

use crate::error::AppError;

pub const DUPLICATE_ITEM_MESSAGE: &str = "This title is already in this watchlist";

/// Maps unique-constraint violations to `Conflict`, everything else to `Database`
pub fn conflict_on_unique(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_on_unique_passes_other_errors_through() {
        let err = conflict_on_unique(sqlx::Error::RowNotFound, "dup");
        assert!(matches!(err, AppError::Database(sqlx::Error::RowNotFound)));
    }
}
