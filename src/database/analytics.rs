use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::analytics::{ConversationDayRow, DailyActivity, ResponseTimeByDay, RoleCount, UserMessageStats, UserResponseTime};
use chrono::{DateTime, Utc};

/// Read-only rollup queries for the admin dashboard. Everything here is
/// recomputed on each call; volumes are internal-dashboard small.
impl PostgresRepository {
    pub async fn total_users(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users").fetch_one(&self.pool).await?;

        Ok(count)
    }

    pub async fn user_types(&self) -> Result<Vec<RoleCount>, AppError> {
        let counts = sqlx::query_as::<_, RoleCount>("SELECT role, COUNT(*) AS count FROM users GROUP BY role ORDER BY role")
            .fetch_all(&self.pool)
            .await?;

        Ok(counts)
    }

    /// Distinct (user, conversation name) pairs ever observed.
    pub async fn total_conversations(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(DISTINCT (employee_id, conversation_name)) FROM messages")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Distinct conversations per calendar day of the reporting
    /// timezone, optionally restricted to events at or after `since`.
    pub async fn conversation_days(&self, timezone: &str, since: Option<DateTime<Utc>>) -> Result<Vec<ConversationDayRow>, AppError> {
        let rows = sqlx::query_as::<_, ConversationDayRow>(
            r#"
            SELECT (m.timestamp AT TIME ZONE $1)::date AS day,
                   COUNT(DISTINCT (m.employee_id, m.conversation_name)) AS conversations
            FROM messages m
            WHERE $2::timestamptz IS NULL OR m.timestamp >= $2
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(timezone)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn assistant_response_times(&self) -> Result<Vec<f64>, AppError> {
        let times = sqlx::query_scalar::<_, f64>(
            "SELECT response_time FROM messages WHERE role = 'assistant' AND response_time IS NOT NULL ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(times)
    }

    pub async fn average_response_time(&self) -> Result<Option<f64>, AppError> {
        let average = sqlx::query_scalar::<_, Option<f64>>(
            "SELECT AVG(response_time) FROM messages WHERE role = 'assistant' AND response_time IS NOT NULL",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(average)
    }

    pub async fn response_time_by_day(&self, timezone: &str, since: DateTime<Utc>) -> Result<Vec<ResponseTimeByDay>, AppError> {
        let rows = sqlx::query_as::<_, ResponseTimeByDay>(
            r#"
            SELECT (m.timestamp AT TIME ZONE $1)::date AS date,
                   AVG(m.response_time) AS average,
                   COUNT(*) AS responses
            FROM messages m
            WHERE m.role = 'assistant' AND m.response_time IS NOT NULL AND m.timestamp >= $2
            GROUP BY date
            ORDER BY date
            "#,
        )
        .bind(timezone)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn response_time_by_user(&self) -> Result<Vec<UserResponseTime>, AppError> {
        let rows = sqlx::query_as::<_, UserResponseTime>(
            r#"
            SELECT m.employee_id,
                   AVG(m.response_time) AS average,
                   COUNT(*) AS responses,
                   MIN(m.response_time) AS min,
                   MAX(m.response_time) AS max
            FROM messages m
            WHERE m.role = 'assistant' AND m.response_time IS NOT NULL
            GROUP BY m.employee_id
            ORDER BY average DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn daily_activity(&self, timezone: &str, since: DateTime<Utc>) -> Result<Vec<DailyActivity>, AppError> {
        let rows = sqlx::query_as::<_, DailyActivity>(
            r#"
            SELECT (m.timestamp AT TIME ZONE $1)::date AS date,
                   COUNT(*) FILTER (WHERE m.role = 'user') AS questions,
                   COUNT(*) FILTER (WHERE m.role = 'assistant') AS responses,
                   COUNT(DISTINCT m.employee_id) AS active_users
            FROM messages m
            WHERE m.timestamp >= $2
            GROUP BY date
            ORDER BY date DESC
            "#,
        )
        .bind(timezone)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn user_message_stats(&self) -> Result<Vec<UserMessageStats>, AppError> {
        let rows = sqlx::query_as::<_, UserMessageStats>(
            r#"
            SELECT m.employee_id,
                   COUNT(*) FILTER (WHERE m.role = 'user') AS questions,
                   COUNT(*) FILTER (WHERE m.role = 'assistant') AS responses,
                   COUNT(DISTINCT m.conversation_name) AS conversations,
                   MIN(m.timestamp) AS first_activity,
                   MAX(m.timestamp) AS last_activity
            FROM messages m
            GROUP BY m.employee_id
            ORDER BY questions DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
