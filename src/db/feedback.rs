use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Feedback, NewFeedback},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Stores a submission; status and priority take their column defaults
    async fn insert(&self, user_id: Uuid, feedback: NewFeedback) -> AppResult<Feedback>;

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Feedback>>;
}

pub struct PgFeedbackStore {
    pool: PgPool,
}

impl PgFeedbackStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const FEEDBACK_COLUMNS: &str = "id, user_id, type, subject, message, language, status, priority, \
                                admin_notes, resolved_at, created_at, updated_at";

#[async_trait::async_trait]
impl FeedbackStore for PgFeedbackStore {
    async fn insert(&self, user_id: Uuid, feedback: NewFeedback) -> AppResult<Feedback> {
        let row = sqlx::query_as::<_, Feedback>(&format!(
            "INSERT INTO feedback (user_id, type, subject, message, language)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {FEEDBACK_COLUMNS}"
        ))
        .bind(user_id)
        .bind(feedback.feedback_type)
        .bind(&feedback.subject)
        .bind(&feedback.message)
        .bind(feedback.language)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Feedback>> {
        let rows = sqlx::query_as::<_, Feedback>(&format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
