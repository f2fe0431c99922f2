use crate::auth::CurrentUser;
use crate::database::conversation::ConversationStore;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::models::conversation::{Conversation, ConversationSummary, RenameRequest};
use crate::service::chat::DEFAULT_CONVERSATION;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{State, delete, get, post};
use rocket_okapi::openapi;
use sqlx::PgPool;
use validator::Validate;

/// All conversations of the current user, oldest first. A user with no
/// history gets a single empty default thread to start in.
#[openapi(tag = "Conversations")]
#[get("/")]
pub async fn list(pool: &State<PgPool>, current_user: CurrentUser) -> Result<Json<Vec<Conversation>>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let mut conversations = repo.load(&current_user.employee_id).await?;

    if conversations.is_empty() {
        conversations.push(Conversation {
            name: DEFAULT_CONVERSATION.to_string(),
            messages: Vec::new(),
        });
    }

    Ok(Json(conversations))
}

/// Message counts and first/last activity per conversation, most
/// recently used first.
#[openapi(tag = "Conversations")]
#[get("/summaries")]
pub async fn summaries(pool: &State<PgPool>, current_user: CurrentUser) -> Result<Json<Vec<ConversationSummary>>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    Ok(Json(repo.summaries(&current_user.employee_id).await?))
}

/// Rename a conversation. 409 when the new name is already taken; the
/// conversation is left untouched in that case.
#[openapi(tag = "Conversations")]
#[post("/rename", data = "<payload>")]
pub async fn rename(pool: &State<PgPool>, current_user: CurrentUser, payload: JsonBody<RenameRequest>) -> Result<Status, AppError> {
    payload.validate()?;
    if payload.old_name == payload.new_name {
        return Err(AppError::BadRequest("New name must differ from the old one".to_string()));
    }

    let repo = PostgresRepository { pool: pool.inner().clone() };
    repo.rename(&current_user.employee_id, &payload.old_name, &payload.new_name).await?;

    Ok(Status::Ok)
}

/// Delete a conversation with all of its messages and feedback.
/// Deleting the last one is allowed; the next listing re-seeds the
/// default thread.
#[openapi(tag = "Conversations")]
#[delete("/<name>")]
pub async fn delete_conversation(pool: &State<PgPool>, current_user: CurrentUser, name: &str) -> Result<Status, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    repo.delete(&current_user.employee_id, name).await?;

    Ok(Status::NoContent)
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![list, summaries, rename, delete_conversation]
}
