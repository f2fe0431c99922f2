use crate::models::user::UserRole;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::Serialize;

/// One bookkeeping row per user, recycled in place on every login.
/// `is_active = true` implies `logout_time` is unset.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, JsonSchema)]
pub struct SessionRecord {
    pub employee_id: String,
    pub login_time: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub logout_time: Option<DateTime<Utc>>,
    pub is_active: bool,
}

/// Session joined with user identity, for presence listings.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, JsonSchema)]
pub struct SessionView {
    pub employee_id: String,
    pub name: String,
    pub surname: String,
    pub role: UserRole,
    pub login_time: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ConnectedUsers {
    pub count: usize,
    pub users: Vec<SessionView>,
}
