use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use validator::Validate;

/// Employee identifiers look like "E123": a letter prefix followed by
/// alphanumerics, as issued by HR.
pub static EMPLOYEE_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9-]{1,19}$").expect("valid employee id pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Editor,
    Legal,
    Hr,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Editor => "editor",
            UserRole::Legal => "legal",
            UserRole::Hr => "hr",
        }
    }

    /// Only the consumer roles get access to the chat surface.
    pub fn can_chat(&self) -> bool {
        matches!(self, UserRole::Legal | UserRole::Hr)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub employee_id: String,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct UserResponse {
    pub employee_id: String,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub role: UserRole,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct RegisterRequest {
    #[validate(regex(path = *EMPLOYEE_ID_RE))]
    pub employee_id: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub surname: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    pub role: UserRole,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LoginRequest {
    pub employee_id: String,
    pub password: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            employee_id: user.employee_id.clone(),
            name: user.name.clone(),
            surname: user.surname.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}
