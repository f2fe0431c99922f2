use crate::auth::CurrentUser;
use crate::database::feedback::FeedbackStore;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::models::feedback::{FeedbackRequest, FeedbackStatus};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{State, get, put};
use rocket_okapi::openapi;
use sqlx::PgPool;
use validator::Validate;

/// Record a thumbs up/down on a message. Voting again on the same
/// message overwrites the previous vote.
#[openapi(tag = "Feedback")]
#[put("/", data = "<payload>")]
pub async fn set(pool: &State<PgPool>, current_user: CurrentUser, payload: JsonBody<FeedbackRequest>) -> Result<Status, AppError> {
    payload.validate()?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    repo.set_feedback(&current_user.employee_id, &payload.conversation, payload.message_index, payload.feedback)
        .await?;

    Ok(Status::Ok)
}

/// The current user's vote on one message; `feedback` is null when no
/// vote was cast.
#[openapi(tag = "Feedback")]
#[get("/?<conversation>&<index>")]
pub async fn get(
    pool: &State<PgPool>,
    current_user: CurrentUser,
    conversation: String,
    index: i32,
) -> Result<Json<FeedbackStatus>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let feedback = repo.get_feedback(&current_user.employee_id, &conversation, index).await?;

    Ok(Json(FeedbackStatus { feedback }))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![set, get]
}
