use reqwest::Client as HttpClient;
use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::Feedback,
};

/// Feedback row plus who sent it, as delivered to the administrator
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackNotification {
    #[serde(flatten)]
    pub feedback: Feedback,
    pub type_label: &'static str,
    pub user_email: Option<String>,
    pub user_name: String,
}

impl FeedbackNotification {
    pub fn new(feedback: Feedback, user_email: Option<String>, user_name: String) -> Self {
        Self {
            type_label: feedback.feedback_type.label(),
            feedback,
            user_email,
            user_name,
        }
    }
}

/// Tells the administrator about new feedback
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait FeedbackNotifier: Send + Sync {
    async fn notify(&self, notification: FeedbackNotification) -> AppResult<()>;
}

/// Posts `{"record": ...}` to a webhook that sends the email
pub struct WebhookNotifier {
    http_client: HttpClient,
    url: String,
    token: Option<String>,
}

impl WebhookNotifier {
    pub fn new(url: String, token: Option<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            url,
            token,
        }
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    record: &'a FeedbackNotification,
}

#[async_trait::async_trait]
impl FeedbackNotifier for WebhookNotifier {
    async fn notify(&self, notification: FeedbackNotification) -> AppResult<()> {
        let mut request = self.http_client.post(&self.url).json(&WebhookPayload {
            record: &notification,
        });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Feedback webhook returned status {}: {}",
                status, body
            )));
        }

        tracing::info!(feedback_id = %notification.feedback.id, "Feedback notification sent");
        Ok(())
    }
}

/// Used when no webhook is configured
pub struct LogNotifier;

#[async_trait::async_trait]
impl FeedbackNotifier for LogNotifier {
    async fn notify(&self, notification: FeedbackNotification) -> AppResult<()> {
        tracing::info!(
            feedback_id = %notification.feedback.id,
            kind = notification.type_label,
            subject = %notification.feedback.subject,
            user = %notification.user_name,
            "New feedback received"
        );
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{FeedbackLanguage, FeedbackPriority, FeedbackStatus, FeedbackType};
    use chrono::Utc;
    use httpmock::prelude::*;
    use serde_json::json;
    use uuid::Uuid;

    pub(crate) fn sample_feedback(user_id: Uuid) -> Feedback {
        Feedback {
            id: Uuid::new_v4(),
            user_id,
            feedback_type: FeedbackType::Feature,
            subject: "Dark mode".to_string(),
            message: "Please add a dark theme".to_string(),
            language: FeedbackLanguage::En,
            status: FeedbackStatus::Pending,
            priority: FeedbackPriority::Medium,
            admin_notes: None,
            resolved_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_webhook_posts_record_with_token() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/notify")
                .header("authorization", "Bearer hook-token");
            then.status(200);
        });

        let notifier = WebhookNotifier::new(server.url("/notify"), Some("hook-token".to_string()));
        let notification = FeedbackNotification::new(
            sample_feedback(Uuid::new_v4()),
            Some("ana@example.com".to_string()),
            "Ana".to_string(),
        );

        notifier.notify(notification).await.unwrap();
        mock.assert();
    }

    #[test]
    fn test_payload_wraps_flattened_record() {
        let notification = FeedbackNotification::new(
            sample_feedback(Uuid::new_v4()),
            Some("ana@example.com".to_string()),
            "Ana".to_string(),
        );
        let payload = serde_json::to_value(WebhookPayload {
            record: &notification,
        })
        .unwrap();

        let record = &payload["record"];
        assert_eq!(record["type"], json!("feature"));
        assert_eq!(record["type_label"], json!("Feature Request"));
        assert_eq!(record["subject"], json!("Dark mode"));
        assert_eq!(record["status"], json!("pending"));
        assert_eq!(record["user_email"], json!("ana@example.com"));
        assert_eq!(record["user_name"], json!("Ana"));
    }

    #[tokio::test]
    async fn test_webhook_failure_is_an_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/notify");
            then.status(500).body("mail provider down");
        });

        let notifier = WebhookNotifier::new(server.url("/notify"), None);
        let notification =
            FeedbackNotification::new(sample_feedback(Uuid::new_v4()), None, "User".to_string());

        let err = notifier.notify(notification).await.unwrap_err();
        assert!(matches!(err, AppError::ExternalApi(_)));
    }
}
