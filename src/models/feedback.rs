use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum FeedbackType {
    Positive,
    Negative,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, JsonSchema)]
pub struct FeedbackRecord {
    pub employee_id: String,
    pub conversation_name: String,
    pub message_index: i32,
    pub feedback_type: FeedbackType,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, sqlx::FromRow, Serialize, JsonSchema)]
pub struct FeedbackCounts {
    pub positive: i64,
    pub negative: i64,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, JsonSchema)]
pub struct UserFeedbackCounts {
    pub employee_id: String,
    pub positive: i64,
    pub negative: i64,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct FeedbackRequest {
    #[validate(length(min = 1, max = 255))]
    pub conversation: String,
    #[validate(range(min = 0))]
    pub message_index: i32,
    pub feedback: FeedbackType,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct FeedbackStatus {
    pub feedback: Option<FeedbackType>,
}
