use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "feedback_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
    Bug,
    Suggestion,
    Feature,
    Compliment,
    Other,
}

impl FeedbackType {
    /// Heading used in the administrator notification
    pub fn label(&self) -> &'static str {
        match self {
            FeedbackType::Bug => "Bug Report",
            FeedbackType::Suggestion => "Suggestion",
            FeedbackType::Feature => "Feature Request",
            FeedbackType::Compliment => "Compliment",
            FeedbackType::Other => "Other",
        }
    }
}

impl std::str::FromStr for FeedbackType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bug" => Ok(FeedbackType::Bug),
            "suggestion" => Ok(FeedbackType::Suggestion),
            "feature" => Ok(FeedbackType::Feature),
            "compliment" => Ok(FeedbackType::Compliment),
            "other" => Ok(FeedbackType::Other),
            other => Err(AppError::InvalidInput(format!(
                "Unknown feedback type: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "feedback_language", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FeedbackLanguage {
    #[default]
    En,
    Es,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "feedback_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
    Pending,
    Reviewed,
    InProgress,
    Resolved,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "feedback_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FeedbackPriority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Feedback {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub feedback_type: FeedbackType,
    pub subject: String,
    pub message: String,
    pub language: FeedbackLanguage,
    pub status: FeedbackStatus,
    pub priority: FeedbackPriority,
    pub admin_notes: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw submission body. Fields are plain strings so that blanks reach
/// validation instead of failing deserialization.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitFeedbackRequest {
    #[serde(rename = "type", default)]
    pub feedback_type: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub language: Option<FeedbackLanguage>,
}

/// A validated submission ready to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct NewFeedback {
    pub feedback_type: FeedbackType,
    pub subject: String,
    pub message: String,
    pub language: FeedbackLanguage,
}

impl SubmitFeedbackRequest {
    pub fn validate(self) -> AppResult<NewFeedback> {
        let feedback_type = self.feedback_type.trim();
        let subject = self.subject.trim();
        let message = self.message.trim();

        if feedback_type.is_empty() || subject.is_empty() || message.is_empty() {
            return Err(AppError::InvalidInput(
                "Please fill in the type, subject and message".to_string(),
            ));
        }

        Ok(NewFeedback {
            feedback_type: feedback_type.parse()?,
            subject: subject.to_string(),
            message: message.to_string(),
            language: self.language.unwrap_or_default(),
        })
    }
}
