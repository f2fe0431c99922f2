use crate::database::postgres_repository::PostgresRepository;
use crate::database::session::SessionRegistry;
use crate::error::app_error::AppError;
use crate::models::session::SessionRecord;
use crate::models::user::{RegisterRequest, User};
use tracing::info;
use validator::Validate;

pub struct AuthService<'a> {
    pub repo: &'a PostgresRepository,
}

impl AuthService<'_> {
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, AppError> {
        request.validate()?;

        if self.repo.get_user_by_employee_id(&request.employee_id).await?.is_some() {
            return Err(AppError::UserAlreadyExists(request.employee_id.clone()));
        }

        let user = self
            .repo
            .create_user(
                &request.employee_id,
                &request.name,
                &request.surname,
                &request.email,
                &request.password,
                request.role,
            )
            .await?;

        info!(employee_id = %user.employee_id, role = %user.role.as_str(), "user registered");

        Ok(user)
    }

    /// Verify credentials and open (or recycle) the user's session row.
    pub async fn login(&self, employee_id: &str, password: &str) -> Result<(User, SessionRecord), AppError> {
        let Some(user) = self.repo.get_user_by_employee_id(employee_id).await? else {
            PostgresRepository::dummy_verify(password);
            return Err(AppError::InvalidCredentials);
        };

        self.repo.verify_password(&user, password).await?;
        let session = self.repo.login(employee_id).await?;

        info!(employee_id = %user.employee_id, "user logged in");

        Ok((user, session))
    }

    pub async fn logout(&self, employee_id: &str) -> Result<(), AppError> {
        self.repo.logout(employee_id).await?;
        info!(employee_id = %employee_id, "user logged out");

        Ok(())
    }
}
