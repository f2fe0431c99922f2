use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::conversation::{ChatRole, Conversation, ConversationSummary, Message};
use chrono::{DateTime, Utc};

/// Durable storage for named message threads. Conversations have no row
/// of their own: one exists exactly while messages carry its name.
#[async_trait::async_trait]
pub trait ConversationStore {
    /// Every message of the user grouped by conversation, insertion
    /// order preserved within and across groups (order of first
    /// appearance). Returns an empty list for a user with no history;
    /// callers materialize their own default thread.
    async fn load(&self, employee_id: &str) -> Result<Vec<Conversation>, AppError>;

    /// Append one message; the conversation is created implicitly.
    async fn append(
        &self,
        employee_id: &str,
        conversation: &str,
        role: ChatRole,
        content: &str,
        response_time: Option<f64>,
    ) -> Result<(), AppError>;

    /// Retag every message (and feedback row) of `old_name` to
    /// `new_name` as one atomic unit. Fails with `NameConflict` when
    /// `new_name` already denotes a conversation of this user.
    async fn rename(&self, employee_id: &str, old_name: &str, new_name: &str) -> Result<(), AppError>;

    /// Drop the whole conversation: all messages and their feedback.
    async fn delete(&self, employee_id: &str, conversation: &str) -> Result<(), AppError>;

    async fn names(&self, employee_id: &str) -> Result<Vec<String>, AppError>;

    async fn summaries(&self, employee_id: &str) -> Result<Vec<ConversationSummary>, AppError>;
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    conversation_name: String,
    role: ChatRole,
    content: String,
    timestamp: DateTime<Utc>,
    response_time: Option<f64>,
}

fn group_messages(rows: Vec<MessageRow>) -> Vec<Conversation> {
    let mut conversations: Vec<Conversation> = Vec::new();
    for row in rows {
        let message = Message {
            role: row.role,
            content: row.content,
            timestamp: row.timestamp,
            response_time: row.response_time,
        };
        match conversations.iter_mut().find(|c| c.name == row.conversation_name) {
            Some(conversation) => conversation.messages.push(message),
            None => conversations.push(Conversation {
                name: row.conversation_name,
                messages: vec![message],
            }),
        }
    }
    conversations
}

#[async_trait::async_trait]
impl ConversationStore for PostgresRepository {
    async fn load(&self, employee_id: &str) -> Result<Vec<Conversation>, AppError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT conversation_name, role, content, timestamp, response_time
            FROM messages
            WHERE employee_id = $1
            ORDER BY id
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(group_messages(rows))
    }

    async fn append(
        &self,
        employee_id: &str,
        conversation: &str,
        role: ChatRole,
        content: &str,
        response_time: Option<f64>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO messages (employee_id, conversation_name, role, content, timestamp, response_time)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(employee_id)
        .bind(conversation)
        .bind(role)
        .bind(content)
        .bind(Utc::now())
        .bind(response_time)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn rename(&self, employee_id: &str, old_name: &str, new_name: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM messages WHERE employee_id = $1 AND conversation_name = $2)",
        )
        .bind(employee_id)
        .bind(new_name)
        .fetch_one(&mut *tx)
        .await?;

        if taken {
            return Err(AppError::NameConflict(new_name.to_string()));
        }

        sqlx::query("UPDATE messages SET conversation_name = $3 WHERE employee_id = $1 AND conversation_name = $2")
            .bind(employee_id)
            .bind(old_name)
            .bind(new_name)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE feedback SET conversation_name = $3 WHERE employee_id = $1 AND conversation_name = $2")
            .bind(employee_id)
            .bind(old_name)
            .bind(new_name)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn delete(&self, employee_id: &str, conversation: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM feedback WHERE employee_id = $1 AND conversation_name = $2")
            .bind(employee_id)
            .bind(conversation)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM messages WHERE employee_id = $1 AND conversation_name = $2")
            .bind(employee_id)
            .bind(conversation)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn names(&self, employee_id: &str) -> Result<Vec<String>, AppError> {
        let names = sqlx::query_scalar::<_, String>(
            r#"
            SELECT conversation_name
            FROM messages
            WHERE employee_id = $1
            GROUP BY conversation_name
            ORDER BY MIN(id)
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }

    async fn summaries(&self, employee_id: &str) -> Result<Vec<ConversationSummary>, AppError> {
        let summaries = sqlx::query_as::<_, ConversationSummary>(
            r#"
            SELECT conversation_name AS name,
                   COUNT(*) AS message_count,
                   MIN(timestamp) AS created_at,
                   MAX(timestamp) AS last_message_at
            FROM messages
            WHERE employee_id = $1
            GROUP BY conversation_name
            ORDER BY last_message_at DESC
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(summaries)
    }
}
