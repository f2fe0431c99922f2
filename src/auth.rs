use crate::database::postgres_repository::PostgresRepository;
use crate::database::session::SessionRegistry;
use crate::error::app_error::AppError;
use crate::models::user::UserRole;
use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{FromRequest, Outcome as RequestOutcome, Request};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{Object, Responses, SecurityRequirement, SecurityScheme, SecuritySchemeData};
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};
use serde::Serialize;
use sqlx::PgPool;

/// Identity of the request, resolved from the private session cookie
/// against the session registry. There is no process-wide "logged in
/// user"; every handler receives its own request-scoped value.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub employee_id: String,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub role: UserRole,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CurrentUser {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        let cookies = req.cookies();
        if let Some(cookie) = cookies.get_private("user") {
            let pool = match req.rocket().state::<PgPool>() {
                Some(pool) => pool,
                None => return Outcome::Error((Status::InternalServerError, AppError::Unauthorized)),
            };

            let repo = PostgresRepository { pool: pool.clone() };

            match repo.active_user(cookie.value()).await {
                Ok(Some(user)) => {
                    // Every authenticated request counts as activity.
                    if let Err(err) = repo.touch(&user.employee_id).await {
                        return Outcome::Error((Status::InternalServerError, err));
                    }

                    let current_user = CurrentUser {
                        employee_id: user.employee_id,
                        name: user.name,
                        surname: user.surname,
                        email: user.email,
                        role: user.role,
                    };
                    req.local_cache(|| Some(current_user.clone()));
                    return Outcome::Success(current_user);
                }
                Ok(None) => return Outcome::Error((Status::Unauthorized, AppError::InvalidCredentials)),
                Err(err) => return Outcome::Error((Status::InternalServerError, err)),
            }
        }

        Outcome::Error((Status::Unauthorized, AppError::InvalidCredentials))
    }
}

/// `CurrentUser` narrowed to the admin role, for the analytics surface.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        match req.guard::<CurrentUser>().await {
            Outcome::Success(user) if user.role == UserRole::Admin => Outcome::Success(AdminUser(user)),
            Outcome::Success(_) => Outcome::Error((Status::Forbidden, AppError::Forbidden)),
            Outcome::Error(error) => Outcome::Error(error),
            Outcome::Forward(forward) => Outcome::Forward(forward),
        }
    }
}

fn cookie_security_scheme() -> SecurityScheme {
    SecurityScheme {
        description: Some("Cookie-based authentication. Log in via POST /api/users/login to obtain the session cookie.".to_string()),
        data: SecuritySchemeData::ApiKey {
            name: "user".to_string(),
            location: "cookie".to_string(),
        },
        extensions: Object::default(),
    }
}

fn unauthorized_responses() -> Responses {
    use rocket_okapi::okapi::openapi3::{RefOr, Response};
    let mut responses = Responses::default();
    responses.responses.insert(
        "401".to_string(),
        RefOr::Object(Response {
            description: "Unauthorized - Authentication required".to_string(),
            ..Default::default()
        }),
    );
    responses
}

impl<'a> OpenApiFromRequest<'a> for CurrentUser {
    fn from_request_input(_gen: &mut OpenApiGenerator, _name: String, _required: bool) -> rocket_okapi::Result<RequestHeaderInput> {
        let mut security_req = SecurityRequirement::new();
        security_req.insert("cookieAuth".to_string(), Vec::new());

        Ok(RequestHeaderInput::Security("cookieAuth".to_string(), cookie_security_scheme(), security_req))
    }

    fn get_responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        Ok(unauthorized_responses())
    }
}

impl<'a> OpenApiFromRequest<'a> for AdminUser {
    fn from_request_input(_gen: &mut OpenApiGenerator, _name: String, _required: bool) -> rocket_okapi::Result<RequestHeaderInput> {
        let mut security_req = SecurityRequirement::new();
        security_req.insert("cookieAuth".to_string(), Vec::new());

        Ok(RequestHeaderInput::Security("cookieAuth".to_string(), cookie_security_scheme(), security_req))
    }

    fn get_responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        use rocket_okapi::okapi::openapi3::{RefOr, Response};
        let mut responses = unauthorized_responses();
        responses.responses.insert(
            "403".to_string(),
            RefOr::Object(Response {
                description: "Forbidden - Administrator role required".to_string(),
                ..Default::default()
            }),
        );
        Ok(responses)
    }
}
