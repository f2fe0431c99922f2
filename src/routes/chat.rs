use crate::Config;
use crate::auth::CurrentUser;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::models::conversation::{ChatReply, ChatRequest};
use crate::service::chat::ChatService;
use crate::service::generate::SharedGenerator;
use crate::service::retrieval::SharedIndex;
use rocket::serde::json::Json;
use rocket::{State, post};
use rocket_okapi::openapi;
use sqlx::PgPool;
use validator::Validate;

/// One chat turn against the knowledge base. Only consumer roles may
/// chat; the answer is persisted together with its generation latency.
#[openapi(tag = "Chat")]
#[post("/", data = "<payload>")]
pub async fn send(
    pool: &State<PgPool>,
    index: &State<SharedIndex>,
    generator: &State<SharedGenerator>,
    config: &State<Config>,
    current_user: CurrentUser,
    payload: JsonBody<ChatRequest>,
) -> Result<Json<ChatReply>, AppError> {
    if !current_user.role.can_chat() {
        return Err(AppError::Forbidden);
    }
    payload.validate()?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let chat = ChatService {
        conversations: &repo,
        index: index.inner().as_ref(),
        generator: generator.inner().as_ref(),
        retrieval: &config.retrieval,
        generation: &config.generation,
    };

    let reply = chat.send_message(&current_user.employee_id, &payload.conversation, &payload.question).await?;

    Ok(Json(reply))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![send]
}
