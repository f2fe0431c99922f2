use crate::models::feedback::FeedbackCounts;
use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::Serialize;

/// Headline numbers for the admin landing view.
#[derive(Debug, Serialize, JsonSchema)]
pub struct DashboardOverview {
    pub total_users: i64,
    pub connected_now: i64,
    pub total_conversations: i64,
    pub total_documents: u64,
    pub feedback: FeedbackCounts,
    /// positive / (positive + negative); absent when no feedback exists.
    pub satisfaction_rate: Option<f64>,
    pub user_types: Vec<RoleCount>,
    pub documents_by_type: Vec<DocTypeCount>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, JsonSchema)]
pub struct RoleCount {
    pub role: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct DocTypeCount {
    pub kind: String,
    pub count: u64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConversationDayRow {
    pub day: NaiveDate,
    pub conversations: i64,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ConversationsByDay {
    pub date: NaiveDate,
    pub conversations: i64,
    pub weekday: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct WeekdayAverage {
    pub weekday: String,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct BucketCount {
    pub bucket: String,
    pub count: u64,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, JsonSchema)]
pub struct ResponseTimeByDay {
    pub date: NaiveDate,
    pub average: f64,
    pub responses: i64,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ResponseTimeSummary {
    /// Mean over every measured assistant message, absent when none exist.
    pub average: Option<f64>,
    pub distribution: Vec<BucketCount>,
    pub by_day: Vec<ResponseTimeByDay>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, JsonSchema)]
pub struct UserResponseTime {
    pub employee_id: String,
    pub average: f64,
    pub responses: i64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, JsonSchema)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub questions: i64,
    pub responses: i64,
    pub active_users: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserMessageStats {
    pub employee_id: String,
    pub questions: i64,
    pub responses: i64,
    pub conversations: i64,
    pub first_activity: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

/// Per-user leaderboard entry merging message and feedback activity.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct UserStats {
    pub employee_id: String,
    pub questions: i64,
    pub responses: i64,
    pub conversations: i64,
    pub first_activity: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub positive_feedbacks: i64,
    pub negative_feedbacks: i64,
    pub satisfaction_rate: Option<f64>,
}
