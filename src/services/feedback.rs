use std::sync::Arc;

use crate::{
    db::FeedbackStore,
    error::AppResult,
    models::{Feedback, Identity, SubmitFeedbackRequest},
    services::notifier::{FeedbackNotification, FeedbackNotifier},
};

/// Validates and stores a submission, then notifies in the background.
///
/// Notification failures are logged and never fail the submission.
pub async fn submit(
    store: &dyn FeedbackStore,
    notifier: Arc<dyn FeedbackNotifier>,
    user: &Identity,
    request: SubmitFeedbackRequest,
) -> AppResult<Feedback> {
    let new_feedback = request.validate()?;
    let feedback = store.insert(user.id, new_feedback).await?;

    tracing::info!(
        feedback_id = %feedback.id,
        kind = feedback.feedback_type.label(),
        "Feedback submitted"
    );

    let notification =
        FeedbackNotification::new(feedback.clone(), user.email.clone(), user.display_name());
    tokio::spawn(async move {
        if let Err(e) = notifier.notify(notification).await {
            tracing::warn!(error = %e, "Failed to send feedback notification");
        }
    });

    Ok(feedback)
}

pub async fn list_mine(store: &dyn FeedbackStore, user: &Identity) -> AppResult<Vec<Feedback>> {
    store.list_for_user(user.id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::feedback::MockFeedbackStore;
    use crate::error::AppError;
    use crate::models::{FeedbackLanguage, FeedbackType};
    use crate::services::notifier::{tests::sample_feedback, MockFeedbackNotifier};
    use tokio::sync::oneshot;
    use uuid::Uuid;

    fn identity() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            email: Some("lu@example.com".to_string()),
            name: Some("Lucía Gómez".to_string()),
            avatar_url: None,
        }
    }

    fn request(feedback_type: &str, subject: &str, message: &str) -> SubmitFeedbackRequest {
        SubmitFeedbackRequest {
            feedback_type: feedback_type.to_string(),
            subject: subject.to_string(),
            message: message.to_string(),
            language: None,
        }
    }

    #[tokio::test]
    async fn test_blank_fields_never_reach_the_store() {
        let mut store = MockFeedbackStore::new();
        store.expect_insert().never();
        let mut notifier = MockFeedbackNotifier::new();
        notifier.expect_notify().never();
        let notifier: Arc<dyn FeedbackNotifier> = Arc::new(notifier);

        for req in [
            request("", "Subject", "Message"),
            request("bug", "  ", "Message"),
            request("bug", "Subject", ""),
        ] {
            let err = submit(&store, notifier.clone(), &identity(), req)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)));
        }
    }

    #[tokio::test]
    async fn test_submit_stores_and_notifies() {
        let user = identity();
        let user_id = user.id;

        let mut store = MockFeedbackStore::new();
        store
            .expect_insert()
            .withf(move |id, new| {
                *id == user_id
                    && new.feedback_type == FeedbackType::Bug
                    && new.subject == "Crash"
                    && new.language == FeedbackLanguage::En
            })
            .times(1)
            .returning(|user_id, _| Ok(sample_feedback(user_id)));

        let (sent_tx, sent_rx) = oneshot::channel();
        let sent_tx = std::sync::Mutex::new(Some(sent_tx));
        let mut notifier = MockFeedbackNotifier::new();
        notifier.expect_notify().times(1).returning(move |notification| {
            if let Some(tx) = sent_tx.lock().unwrap().take() {
                let _ = tx.send((notification.user_name, notification.user_email));
            }
            Ok(())
        });

        let feedback = submit(
            &store,
            Arc::new(notifier),
            &user,
            request("bug", " Crash ", "The app closes when I search"),
        )
        .await
        .unwrap();

        assert_eq!(feedback.user_id, user_id);
        let (name, email) = sent_rx.await.unwrap();
        assert_eq!(name, "Lucía Gómez");
        assert_eq!(email.as_deref(), Some("lu@example.com"));
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_fail_submission() {
        let mut store = MockFeedbackStore::new();
        store
            .expect_insert()
            .returning(|user_id, _| Ok(sample_feedback(user_id)));
        let mut notifier = MockFeedbackNotifier::new();
        notifier
            .expect_notify()
            .returning(|_| Err(AppError::ExternalApi("webhook down".to_string())));

        let result = submit(
            &store,
            Arc::new(notifier),
            &identity(),
            request("compliment", "Thanks", "Love it"),
        )
        .await;

        assert!(result.is_ok());
    }
}
