use crate::database::conversation::ConversationStore;
use crate::database::feedback::FeedbackStore;
use crate::database::session::SessionRegistry;
use crate::error::app_error::AppError;
use crate::models::conversation::{ChatRole, Conversation, ConversationSummary, Message};
use crate::models::feedback::{FeedbackCounts, FeedbackRecord, FeedbackType, UserFeedbackCounts};
use crate::models::session::{SessionRecord, SessionView};
use crate::models::user::UserRole;
use crate::service::generate::AnswerGenerator;
use crate::service::retrieval::{Document, DocumentIndex};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use std::collections::BTreeMap;
use std::sync::Mutex;

struct TestUser {
    role: UserRole,
    name: String,
    surname: String,
}

struct StoredMessage {
    employee_id: String,
    conversation: String,
    message: Message,
}

#[derive(Default)]
struct Inner {
    users: BTreeMap<String, TestUser>,
    sessions: BTreeMap<String, SessionRecord>,
    messages: Vec<StoredMessage>,
    feedback: BTreeMap<(String, String, i32), (FeedbackType, DateTime<Utc>)>,
}

/// In-memory stand-in for the Postgres repository, faithful to the
/// contracts of the store traits so session, conversation and feedback
/// semantics can be exercised without a database.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, employee_id: &str, role: UserRole) {
        let mut inner = self.inner.lock().expect("store lock");
        inner.users.insert(
            employee_id.to_string(),
            TestUser {
                role,
                name: "Test".to_string(),
                surname: employee_id.to_string(),
            },
        );
    }

    /// Rewind a session's login time, for ghost-sweep scenarios.
    pub fn backdate_login(&self, employee_id: &str, login_time: DateTime<Utc>) {
        let mut inner = self.inner.lock().expect("store lock");
        if let Some(session) = inner.sessions.get_mut(employee_id) {
            session.login_time = login_time;
        }
    }

    fn view(inner: &Inner, session: &SessionRecord) -> SessionView {
        let (name, surname, role) = inner
            .users
            .get(&session.employee_id)
            .map(|user| (user.name.clone(), user.surname.clone(), user.role))
            .unwrap_or_else(|| ("Test".to_string(), session.employee_id.clone(), UserRole::Hr));

        SessionView {
            employee_id: session.employee_id.clone(),
            name,
            surname,
            role,
            login_time: session.login_time,
            last_activity: session.last_activity,
            is_active: session.is_active,
        }
    }

    fn is_admin(inner: &Inner, employee_id: &str) -> bool {
        inner.users.get(employee_id).is_some_and(|user| user.role == UserRole::Admin)
    }
}

#[async_trait::async_trait]
impl SessionRegistry for MemoryStore {
    async fn login(&self, employee_id: &str) -> Result<SessionRecord, AppError> {
        let now = Utc::now();
        let mut inner = self.inner.lock().expect("store lock");
        let session = SessionRecord {
            employee_id: employee_id.to_string(),
            login_time: now,
            last_activity: now,
            logout_time: None,
            is_active: true,
        };
        inner.sessions.insert(employee_id.to_string(), session.clone());
        Ok(session)
    }

    async fn touch(&self, employee_id: &str) -> Result<(), AppError> {
        let mut inner = self.inner.lock().expect("store lock");
        if let Some(session) = inner.sessions.get_mut(employee_id)
            && session.is_active
        {
            session.last_activity = Utc::now();
        }
        Ok(())
    }

    async fn logout(&self, employee_id: &str) -> Result<(), AppError> {
        let mut inner = self.inner.lock().expect("store lock");
        if let Some(session) = inner.sessions.get_mut(employee_id)
            && session.is_active
        {
            session.logout_time = Some(Utc::now());
            session.is_active = false;
        }
        Ok(())
    }

    async fn reclaim_ghosts(&self, ttl: Duration) -> Result<u64, AppError> {
        let now = Utc::now();
        let cutoff = now - ttl;
        let mut inner = self.inner.lock().expect("store lock");
        let mut reclaimed = 0;
        for session in inner.sessions.values_mut() {
            if session.is_active && session.login_time < cutoff {
                session.is_active = false;
                session.logout_time = Some(now);
                reclaimed += 1;
            }
        }
        Ok(reclaimed)
    }

    async fn get(&self, employee_id: &str) -> Result<Option<SessionRecord>, AppError> {
        let inner = self.inner.lock().expect("store lock");
        Ok(inner.sessions.get(employee_id).cloned())
    }

    async fn count_active(&self, exclude_admin: bool) -> Result<i64, AppError> {
        let inner = self.inner.lock().expect("store lock");
        let count = inner
            .sessions
            .values()
            .filter(|session| session.is_active && !(exclude_admin && Self::is_admin(&inner, &session.employee_id)))
            .count();
        Ok(count as i64)
    }

    async fn list_active(&self, exclude_admin: bool) -> Result<Vec<SessionView>, AppError> {
        let inner = self.inner.lock().expect("store lock");
        let mut views: Vec<SessionView> = inner
            .sessions
            .values()
            .filter(|session| session.is_active && !(exclude_admin && Self::is_admin(&inner, &session.employee_id)))
            .map(|session| Self::view(&inner, session))
            .collect();
        views.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        Ok(views)
    }

    async fn list_active_today(&self, timezone: &str, today: NaiveDate) -> Result<Vec<SessionView>, AppError> {
        let tz: Tz = timezone
            .parse()
            .map_err(|_| AppError::Configuration(format!("invalid timezone: {timezone}")))?;
        let inner = self.inner.lock().expect("store lock");
        let mut views: Vec<SessionView> = inner
            .sessions
            .values()
            .filter(|session| session.login_time.with_timezone(&tz).date_naive() == today)
            .map(|session| Self::view(&inner, session))
            .collect();
        views.sort_by(|a, b| b.login_time.cmp(&a.login_time));
        Ok(views)
    }
}

#[async_trait::async_trait]
impl ConversationStore for MemoryStore {
    async fn load(&self, employee_id: &str) -> Result<Vec<Conversation>, AppError> {
        let inner = self.inner.lock().expect("store lock");
        let mut conversations: Vec<Conversation> = Vec::new();
        for stored in inner.messages.iter().filter(|stored| stored.employee_id == employee_id) {
            match conversations.iter_mut().find(|c| c.name == stored.conversation) {
                Some(conversation) => conversation.messages.push(stored.message.clone()),
                None => conversations.push(Conversation {
                    name: stored.conversation.clone(),
                    messages: vec![stored.message.clone()],
                }),
            }
        }
        Ok(conversations)
    }

    async fn append(
        &self,
        employee_id: &str,
        conversation: &str,
        role: ChatRole,
        content: &str,
        response_time: Option<f64>,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.lock().expect("store lock");
        inner.messages.push(StoredMessage {
            employee_id: employee_id.to_string(),
            conversation: conversation.to_string(),
            message: Message {
                role,
                content: content.to_string(),
                timestamp: Utc::now(),
                response_time,
            },
        });
        Ok(())
    }

    async fn rename(&self, employee_id: &str, old_name: &str, new_name: &str) -> Result<(), AppError> {
        let mut inner = self.inner.lock().expect("store lock");

        let taken = inner
            .messages
            .iter()
            .any(|stored| stored.employee_id == employee_id && stored.conversation == new_name);
        if taken {
            return Err(AppError::NameConflict(new_name.to_string()));
        }

        for stored in inner.messages.iter_mut() {
            if stored.employee_id == employee_id && stored.conversation == old_name {
                stored.conversation = new_name.to_string();
            }
        }

        let retagged: Vec<((String, String, i32), (FeedbackType, DateTime<Utc>))> = inner
            .feedback
            .iter()
            .map(|((user, conversation, index), value)| {
                let conversation = if user == employee_id && conversation == old_name {
                    new_name.to_string()
                } else {
                    conversation.clone()
                };
                ((user.clone(), conversation, *index), *value)
            })
            .collect();
        inner.feedback = retagged.into_iter().collect();

        Ok(())
    }

    async fn delete(&self, employee_id: &str, conversation: &str) -> Result<(), AppError> {
        let mut inner = self.inner.lock().expect("store lock");
        inner
            .messages
            .retain(|stored| !(stored.employee_id == employee_id && stored.conversation == conversation));
        inner
            .feedback
            .retain(|(user, name, _), _| !(user == employee_id && name == conversation));
        Ok(())
    }

    async fn names(&self, employee_id: &str) -> Result<Vec<String>, AppError> {
        let conversations = self.load(employee_id).await?;
        Ok(conversations.into_iter().map(|conversation| conversation.name).collect())
    }

    async fn summaries(&self, employee_id: &str) -> Result<Vec<ConversationSummary>, AppError> {
        let conversations = self.load(employee_id).await?;
        let mut summaries: Vec<ConversationSummary> = conversations
            .into_iter()
            .filter(|conversation| !conversation.messages.is_empty())
            .map(|conversation| ConversationSummary {
                message_count: conversation.messages.len() as i64,
                created_at: conversation.messages.first().expect("non-empty").timestamp,
                last_message_at: conversation.messages.last().expect("non-empty").timestamp,
                name: conversation.name,
            })
            .collect();
        summaries.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
        Ok(summaries)
    }
}

#[async_trait::async_trait]
impl FeedbackStore for MemoryStore {
    async fn set_feedback(
        &self,
        employee_id: &str,
        conversation: &str,
        message_index: i32,
        feedback: FeedbackType,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.lock().expect("store lock");
        inner.feedback.insert(
            (employee_id.to_string(), conversation.to_string(), message_index),
            (feedback, Utc::now()),
        );
        Ok(())
    }

    async fn get_feedback(
        &self,
        employee_id: &str,
        conversation: &str,
        message_index: i32,
    ) -> Result<Option<FeedbackType>, AppError> {
        let inner = self.inner.lock().expect("store lock");
        Ok(inner
            .feedback
            .get(&(employee_id.to_string(), conversation.to_string(), message_index))
            .map(|(feedback, _)| *feedback))
    }

    async fn feedback_totals(&self) -> Result<FeedbackCounts, AppError> {
        let inner = self.inner.lock().expect("store lock");
        let mut counts = FeedbackCounts::default();
        for (feedback, _) in inner.feedback.values() {
            match feedback {
                FeedbackType::Positive => counts.positive += 1,
                FeedbackType::Negative => counts.negative += 1,
            }
        }
        Ok(counts)
    }

    async fn feedback_by_user(&self) -> Result<Vec<UserFeedbackCounts>, AppError> {
        let inner = self.inner.lock().expect("store lock");
        let mut by_user: BTreeMap<String, (i64, i64)> = BTreeMap::new();
        for ((user, _, _), (feedback, _)) in inner.feedback.iter() {
            let entry = by_user.entry(user.clone()).or_default();
            match feedback {
                FeedbackType::Positive => entry.0 += 1,
                FeedbackType::Negative => entry.1 += 1,
            }
        }
        Ok(by_user
            .into_iter()
            .map(|(employee_id, (positive, negative))| UserFeedbackCounts {
                employee_id,
                positive,
                negative,
            })
            .collect())
    }

    async fn all_feedback(&self) -> Result<Vec<FeedbackRecord>, AppError> {
        let inner = self.inner.lock().expect("store lock");
        let mut records: Vec<FeedbackRecord> = inner
            .feedback
            .iter()
            .map(|((employee_id, conversation_name, message_index), (feedback_type, timestamp))| FeedbackRecord {
                employee_id: employee_id.clone(),
                conversation_name: conversation_name.clone(),
                message_index: *message_index,
                feedback_type: *feedback_type,
                timestamp: *timestamp,
            })
            .collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }
}

/// Retrieval stub returning a fixed context chunk.
#[derive(Default)]
pub struct StubIndex {
    pub chunks: Mutex<Vec<BTreeMap<String, String>>>,
}

#[async_trait::async_trait]
impl DocumentIndex for StubIndex {
    async fn add_documents(&self, documents: &[Document], _ids: &[String]) -> Result<(), AppError> {
        let mut chunks = self.chunks.lock().expect("stub lock");
        chunks.extend(documents.iter().map(|document| document.metadata.clone()));
        Ok(())
    }

    async fn metadata(&self) -> Result<Vec<BTreeMap<String, String>>, AppError> {
        Ok(self.chunks.lock().expect("stub lock").clone())
    }

    async fn delete(&self, _ids: &[String]) -> Result<(), AppError> {
        Ok(())
    }

    async fn search(&self, _query: &str, _top_k: usize, _score_threshold: f32) -> Result<Vec<Document>, AppError> {
        Ok(vec![Document {
            content: "extrait de document".to_string(),
            metadata: BTreeMap::new(),
        }])
    }
}

/// Generator stub answering every question with a canned string.
pub struct StubGenerator {
    answer: String,
}

impl StubGenerator {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl AnswerGenerator for StubGenerator {
    async fn generate(&self, _question: &str, _context: &str, _history: &str) -> Result<String, AppError> {
        Ok(self.answer.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryStore, StubGenerator, StubIndex};
    use crate::config::{GenerationConfig, RetrievalConfig};
    use crate::database::conversation::ConversationStore;
    use crate::database::feedback::FeedbackStore;
    use crate::database::session::SessionRegistry;
    use crate::models::conversation::ChatRole;
    use crate::models::feedback::FeedbackType;
    use crate::models::user::UserRole;
    use crate::service::analytics::response_time_distribution;
    use crate::service::chat::ChatService;

    /// Full pass through the subsystem: login, two chat turns with
    /// auto-naming, a measured slow answer, positive feedback, the
    /// derived metrics, then logout.
    #[tokio::test]
    async fn chat_session_end_to_end() {
        let store = MemoryStore::new();
        store.add_user("E123", UserRole::Hr);

        let session = store.login("E123").await.expect("login");
        assert!(session.is_active);
        assert!(session.logout_time.is_none());

        let index = StubIndex::default();
        let generator = StubGenerator::new("Les frais se déclarent dans l'outil de notes de frais.");
        let retrieval = RetrievalConfig::default();
        let generation = GenerationConfig::default();
        let chat = ChatService {
            conversations: &store,
            index: &index,
            generator: &generator,
            retrieval: &retrieval,
            generation: &generation,
        };

        let first = chat
            .send_message("E123", "Conversation 1", "Comment déclarer mes frais de déplacement ?")
            .await
            .expect("first turn");
        assert_eq!(first.conversation, "Comment déclarer mes frais de déplacement ?");

        let second = chat
            .send_message("E123", &first.conversation, "Et pour un déplacement à l'étranger ?")
            .await
            .expect("second turn");
        assert_eq!(second.conversation, first.conversation);

        // A slow answer lands in the measured history alongside the two
        // stubbed (near-instant) ones.
        store
            .append("E123", &first.conversation, ChatRole::Assistant, "Réponse détaillée.", Some(4.2))
            .await
            .expect("append");

        // Thumbs up on the first assistant message (position 1).
        store
            .set_feedback("E123", &first.conversation, 1, FeedbackType::Positive)
            .await
            .expect("feedback");

        let conversations = store.load("E123").await.expect("load");
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].messages.len(), 5);

        let times: Vec<f64> = conversations[0].messages.iter().filter_map(|message| message.response_time).collect();
        let distribution = response_time_distribution(&times);
        let slow_bucket = distribution.iter().find(|bucket| bucket.bucket == "3-5s").expect("bucket");
        assert_eq!(slow_bucket.count, 1);

        let totals = store.feedback_totals().await.expect("totals");
        assert_eq!(totals.positive, 1);
        assert_eq!(totals.negative, 0);

        store.logout("E123").await.expect("logout");
        let closed = store.get("E123").await.expect("get").expect("session");
        assert!(!closed.is_active);
        assert!(closed.logout_time.is_some());
    }
}
