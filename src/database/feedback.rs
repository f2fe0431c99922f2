use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::feedback::{FeedbackCounts, FeedbackRecord, FeedbackType, UserFeedbackCounts};
use chrono::Utc;

/// Thumbs up/down votes on assistant messages. A vote is keyed by
/// (user, conversation name, message position); re-voting overwrites.
///
/// The positional key stays valid because messages are only ever
/// removed by whole-conversation deletion, which drops the votes too.
#[async_trait::async_trait]
pub trait FeedbackStore {
    async fn set_feedback(
        &self,
        employee_id: &str,
        conversation: &str,
        message_index: i32,
        feedback: FeedbackType,
    ) -> Result<(), AppError>;

    async fn get_feedback(
        &self,
        employee_id: &str,
        conversation: &str,
        message_index: i32,
    ) -> Result<Option<FeedbackType>, AppError>;

    async fn feedback_totals(&self) -> Result<FeedbackCounts, AppError>;

    async fn feedback_by_user(&self) -> Result<Vec<UserFeedbackCounts>, AppError>;

    /// Every vote, newest first, for the admin export view.
    async fn all_feedback(&self) -> Result<Vec<FeedbackRecord>, AppError>;
}

#[async_trait::async_trait]
impl FeedbackStore for PostgresRepository {
    async fn set_feedback(
        &self,
        employee_id: &str,
        conversation: &str,
        message_index: i32,
        feedback: FeedbackType,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO feedback (employee_id, conversation_name, message_index, feedback_type, timestamp)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (employee_id, conversation_name, message_index) DO UPDATE
            SET feedback_type = EXCLUDED.feedback_type,
                timestamp = EXCLUDED.timestamp
            "#,
        )
        .bind(employee_id)
        .bind(conversation)
        .bind(message_index)
        .bind(feedback)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_feedback(
        &self,
        employee_id: &str,
        conversation: &str,
        message_index: i32,
    ) -> Result<Option<FeedbackType>, AppError> {
        let feedback = sqlx::query_scalar::<_, FeedbackType>(
            r#"
            SELECT feedback_type
            FROM feedback
            WHERE employee_id = $1 AND conversation_name = $2 AND message_index = $3
            "#,
        )
        .bind(employee_id)
        .bind(conversation)
        .bind(message_index)
        .fetch_optional(&self.pool)
        .await?;

        Ok(feedback)
    }

    async fn feedback_totals(&self) -> Result<FeedbackCounts, AppError> {
        let counts = sqlx::query_as::<_, FeedbackCounts>(
            r#"
            SELECT COUNT(*) FILTER (WHERE feedback_type = 'positive') AS positive,
                   COUNT(*) FILTER (WHERE feedback_type = 'negative') AS negative
            FROM feedback
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }

    async fn feedback_by_user(&self) -> Result<Vec<UserFeedbackCounts>, AppError> {
        let counts = sqlx::query_as::<_, UserFeedbackCounts>(
            r#"
            SELECT employee_id,
                   COUNT(*) FILTER (WHERE feedback_type = 'positive') AS positive,
                   COUNT(*) FILTER (WHERE feedback_type = 'negative') AS negative
            FROM feedback
            GROUP BY employee_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    async fn all_feedback(&self) -> Result<Vec<FeedbackRecord>, AppError> {
        let records = sqlx::query_as::<_, FeedbackRecord>(
            r#"
            SELECT employee_id, conversation_name, message_index, feedback_type, timestamp
            FROM feedback
            ORDER BY timestamp DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
