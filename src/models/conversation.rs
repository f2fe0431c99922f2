use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// A single chat turn. `response_time` is only present on assistant
/// messages whose generation latency was measured.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Message {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub response_time: Option<f64>,
}

/// A named thread of messages in insertion order. Feedback addresses
/// messages by their position in `messages`.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Conversation {
    pub name: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, JsonSchema)]
pub struct ConversationSummary {
    pub name: String,
    pub message_count: i64,
    pub created_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct RenameRequest {
    #[validate(length(min = 1, max = 255))]
    pub old_name: String,
    #[validate(length(min = 1, max = 255))]
    pub new_name: String,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 255))]
    pub conversation: String,
    #[validate(length(min = 1))]
    pub question: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ChatReply {
    /// Final conversation name, which may differ from the requested one
    /// when the first message triggers auto-naming.
    pub conversation: String,
    pub answer: String,
    pub response_time: f64,
}
