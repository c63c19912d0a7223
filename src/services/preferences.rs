use uuid::Uuid;

use crate::{
    db::PreferenceStore,
    error::AppResult,
    models::{MediaType, PreferenceEntry, PreferenceKind, PreferenceStatus, ToggleOutcome},
};

/// Flips the favorite or watched flag and reports the new value
pub async fn toggle(
    store: &dyn PreferenceStore,
    kind: PreferenceKind,
    user_id: Uuid,
    media_id: i64,
    media_type: MediaType,
) -> AppResult<ToggleOutcome> {
    let active = store.toggle(kind, user_id, media_id, media_type).await?;

    tracing::debug!(
        user_id = %user_id,
        media_id,
        media_type = %media_type,
        kind = kind.table(),
        active,
        "Preference toggled"
    );

    Ok(ToggleOutcome {
        media_id,
        media_type,
        active,
    })
}

pub async fn status(
    store: &dyn PreferenceStore,
    user_id: Uuid,
    media_id: i64,
    media_type: MediaType,
) -> AppResult<PreferenceStatus> {
    store.status(user_id, media_id, media_type).await
}

pub async fn list(
    store: &dyn PreferenceStore,
    kind: PreferenceKind,
    user_id: Uuid,
) -> AppResult<Vec<PreferenceEntry>> {
    store.list(kind, user_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::preferences::MockPreferenceStore, error::AppError};
    use mockall::predicate::eq;
    use tokio_test::{assert_err, assert_ok};
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    #[tokio::test]
    async fn test_toggle_twice_round_trips() {
        let user = Uuid::new_v4();
        let flag = Arc::new(AtomicBool::new(false));
        let state = flag.clone();

        let mut store = MockPreferenceStore::new();
        store
            .expect_toggle()
            .with(eq(PreferenceKind::Watched), eq(user), eq(603), eq(MediaType::Movie))
            .times(2)
            .returning(move |_, _, _, _| Ok(!state.fetch_xor(true, Ordering::SeqCst)));

        let first = toggle(&store, PreferenceKind::Watched, user, 603, MediaType::Movie)
            .await
            .unwrap();
        let second = toggle(&store, PreferenceKind::Watched, user, 603, MediaType::Movie)
            .await
            .unwrap();

        assert!(first.active);
        assert!(!second.active);
        assert!(!flag.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_status_passes_through() {
        let user = Uuid::new_v4();
        let mut store = MockPreferenceStore::new();
        store
            .expect_status()
            .with(eq(user), eq(1396), eq(MediaType::Tv))
            .returning(|_, _, _| {
                Ok(PreferenceStatus {
                    favorite: true,
                    watched: false,
                })
            });

        let status = assert_ok!(status(&store, user, 1396, MediaType::Tv).await);
        assert!(status.favorite);
        assert!(!status.watched);
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let mut store = MockPreferenceStore::new();
        store
            .expect_list()
            .returning(|_, _| Err(AppError::Internal("connection reset".to_string())));

        let err = assert_err!(list(&store, PreferenceKind::Favorite, Uuid::new_v4()).await);
        assert!(matches!(err, AppError::Internal(_)));
    }
}
