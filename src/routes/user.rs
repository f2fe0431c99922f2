use crate::auth::CurrentUser;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::models::user::{LoginRequest, RegisterRequest, UserResponse};
use crate::service::auth::AuthService;
use rocket::http::{Cookie, CookieJar, Status};
use rocket::serde::json::Json;
use rocket::{State, get, post};
use rocket_okapi::openapi;
use sqlx::PgPool;

/// Register a new account. Fails with 409 when the employee id is
/// already taken.
#[openapi(tag = "Users")]
#[post("/", data = "<payload>")]
pub async fn register(pool: &State<PgPool>, payload: JsonBody<RegisterRequest>) -> Result<Json<UserResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let user = AuthService { repo: &repo }.register(&payload).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// Verify credentials, open (or recycle) the session row and set the
/// private session cookie.
#[openapi(skip)]
#[post("/login", data = "<payload>")]
pub async fn login(pool: &State<PgPool>, cookies: &CookieJar<'_>, payload: JsonBody<LoginRequest>) -> Result<Json<UserResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let (user, _session) = AuthService { repo: &repo }.login(&payload.employee_id, &payload.password).await?;

    cookies.add_private(Cookie::build(("user", user.employee_id.clone())).path("/").build());

    Ok(Json(UserResponse::from(&user)))
}

/// Close the session and drop the cookie. Safe to call twice: with no
/// cookie or no active session there is nothing left to do.
#[openapi(skip)]
#[post("/logout")]
pub async fn logout(pool: &State<PgPool>, cookies: &CookieJar<'_>) -> Result<Status, AppError> {
    if let Some(cookie) = cookies.get_private("user") {
        let repo = PostgresRepository { pool: pool.inner().clone() };
        AuthService { repo: &repo }.logout(cookie.value()).await?;
        cookies.remove_private(Cookie::build("user").build());
    }

    Ok(Status::Ok)
}

#[openapi(tag = "Users")]
#[get("/me")]
pub async fn me(current_user: CurrentUser) -> Json<UserResponse> {
    Json(UserResponse {
        employee_id: current_user.employee_id,
        name: current_user.name,
        surname: current_user.surname,
        email: current_user.email,
        role: current_user.role,
    })
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![register, login, logout, me]
}
