use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::session::{SessionRecord, SessionView};
use crate::models::user::User;
use chrono::{Duration, NaiveDate, Utc};

/// Bookkeeping of who is logged in. One row per user: a login recycles
/// the existing row instead of stacking a new one, so only the latest
/// login/logout cycle is retained.
#[async_trait::async_trait]
pub trait SessionRegistry {
    /// Upsert on login: fresh `login_time`/`last_activity`, active flag
    /// set, any previous `logout_time` discarded.
    async fn login(&self, employee_id: &str) -> Result<SessionRecord, AppError>;

    /// Refresh `last_activity`. Silently does nothing when the user has
    /// no active session; an activity ping must never fail its caller.
    async fn touch(&self, employee_id: &str) -> Result<(), AppError>;

    /// Close the active session. Idempotent: a second call matches no
    /// row and leaves the first `logout_time` in place.
    async fn logout(&self, employee_id: &str) -> Result<(), AppError>;

    /// Force-close every active session older than `ttl` (sessions left
    /// behind by closed browsers or crashes). Runs inline before any
    /// presence read; returns the number of sessions reclaimed.
    async fn reclaim_ghosts(&self, ttl: Duration) -> Result<u64, AppError>;

    async fn get(&self, employee_id: &str) -> Result<Option<SessionRecord>, AppError>;

    async fn count_active(&self, exclude_admin: bool) -> Result<i64, AppError>;

    async fn list_active(&self, exclude_admin: bool) -> Result<Vec<SessionView>, AppError>;

    /// Everyone whose latest login falls on `today` in the reporting
    /// timezone, whether or not they are still connected.
    async fn list_active_today(&self, timezone: &str, today: NaiveDate) -> Result<Vec<SessionView>, AppError>;
}

#[async_trait::async_trait]
impl SessionRegistry for PostgresRepository {
    async fn login(&self, employee_id: &str) -> Result<SessionRecord, AppError> {
        let now = Utc::now();
        let session = sqlx::query_as::<_, SessionRecord>(
            r#"
            INSERT INTO sessions (employee_id, login_time, last_activity, logout_time, is_active)
            VALUES ($1, $2, $2, NULL, TRUE)
            ON CONFLICT (employee_id) DO UPDATE
            SET login_time = EXCLUDED.login_time,
                last_activity = EXCLUDED.last_activity,
                logout_time = NULL,
                is_active = TRUE
            RETURNING employee_id, login_time, last_activity, logout_time, is_active
            "#,
        )
        .bind(employee_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    async fn touch(&self, employee_id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE sessions SET last_activity = $2 WHERE employee_id = $1 AND is_active")
            .bind(employee_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn logout(&self, employee_id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE sessions SET logout_time = $2, is_active = FALSE WHERE employee_id = $1 AND is_active")
            .bind(employee_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn reclaim_ghosts(&self, ttl: Duration) -> Result<u64, AppError> {
        let now = Utc::now();
        let cutoff = now - ttl;
        let result = sqlx::query("UPDATE sessions SET is_active = FALSE, logout_time = $1 WHERE is_active AND login_time < $2")
            .bind(now)
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn get(&self, employee_id: &str) -> Result<Option<SessionRecord>, AppError> {
        let session = sqlx::query_as::<_, SessionRecord>(
            r#"
            SELECT employee_id, login_time, last_activity, logout_time, is_active
            FROM sessions
            WHERE employee_id = $1
            "#,
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn count_active(&self, exclude_admin: bool) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM sessions s
            JOIN users u ON u.employee_id = s.employee_id
            WHERE s.is_active AND NOT ($1 AND u.role = 'admin')
            "#,
        )
        .bind(exclude_admin)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn list_active(&self, exclude_admin: bool) -> Result<Vec<SessionView>, AppError> {
        let sessions = sqlx::query_as::<_, SessionView>(
            r#"
            SELECT s.employee_id, u.name, u.surname, u.role,
                   s.login_time, s.last_activity, s.is_active
            FROM sessions s
            JOIN users u ON u.employee_id = s.employee_id
            WHERE s.is_active AND NOT ($1 AND u.role = 'admin')
            ORDER BY s.last_activity DESC
            "#,
        )
        .bind(exclude_admin)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    async fn list_active_today(&self, timezone: &str, today: NaiveDate) -> Result<Vec<SessionView>, AppError> {
        let sessions = sqlx::query_as::<_, SessionView>(
            r#"
            SELECT s.employee_id, u.name, u.surname, u.role,
                   s.login_time, s.last_activity, s.is_active
            FROM sessions s
            JOIN users u ON u.employee_id = s.employee_id
            WHERE (s.login_time AT TIME ZONE $1)::date = $2
            ORDER BY s.login_time DESC
            "#,
        )
        .bind(timezone)
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }
}

impl PostgresRepository {
    /// User lookup gated on an active session, used by the request guard.
    pub async fn active_user(&self, employee_id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.employee_id, u.name, u.surname, u.email, u.password_hash, u.role
            FROM users u
            JOIN sessions s ON s.employee_id = u.employee_id
            WHERE u.employee_id = $1 AND s.is_active
            "#,
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
