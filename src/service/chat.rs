use crate::config::{GenerationConfig, RetrievalConfig};
use crate::database::conversation::ConversationStore;
use crate::error::app_error::AppError;
use crate::models::conversation::{ChatReply, ChatRole, Message};
use crate::service::generate::AnswerGenerator;
use crate::service::retrieval::{Document, DocumentIndex};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Instant;

/// Name given to the thread a new user starts in.
pub const DEFAULT_CONVERSATION: &str = "Conversation 1";

const FALLBACK_NAME: &str = "Nouvelle conversation";
const MAX_NAME_CHARS: usize = 50;

static GENERIC_NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^Conversation \d+$").expect("valid generic name pattern"));

/// Placeholder names ("Conversation 3") are replaced by a snippet of
/// the first message once the user actually writes something.
pub fn is_generic_name(name: &str) -> bool {
    GENERIC_NAME_RE.is_match(name)
}

/// Derive a conversation title from the first message: the first 50
/// characters, elided when longer, with a fixed fallback for messages
/// too short to be a useful title.
pub fn derive_conversation_name(first_message: &str) -> String {
    let trimmed = first_message.trim();

    let name = if trimmed.chars().count() > MAX_NAME_CHARS {
        let head: String = trimmed.chars().take(MAX_NAME_CHARS - 3).collect();
        format!("{head}...")
    } else {
        trimmed.to_string()
    };

    if name.chars().count() < 3 {
        return FALLBACK_NAME.to_string();
    }

    name
}

/// Disambiguate against the user's existing conversations by appending
/// " (1)", " (2)", ... until the name is free.
pub fn unique_name(candidate: &str, existing: &[String]) -> String {
    if !existing.iter().any(|name| name == candidate) {
        return candidate.to_string();
    }

    let mut counter = 1;
    loop {
        let suffixed = format!("{candidate} ({counter})");
        if !existing.iter().any(|name| name == &suffixed) {
            return suffixed;
        }
        counter += 1;
    }
}

/// Textual history injected into the prompt, limited to the trailing
/// messages so long threads do not overflow the context.
pub fn build_history(messages: &[Message], limit: usize) -> String {
    let start = messages.len().saturating_sub(limit);
    let mut history = String::new();
    for message in &messages[start..] {
        let prefix = match message.role {
            ChatRole::User => "Utilisateur",
            ChatRole::Assistant => "Assistant",
        };
        history.push_str(prefix);
        history.push_str(" : ");
        history.push_str(&message.content);
        history.push('\n');
    }
    history
}

pub fn format_context(documents: &[Document]) -> String {
    documents.iter().map(|doc| doc.content.as_str()).collect::<Vec<_>>().join("\n\n")
}

pub struct ChatService<'a> {
    pub conversations: &'a dyn ConversationStore,
    pub index: &'a dyn DocumentIndex,
    pub generator: &'a dyn AnswerGenerator,
    pub retrieval: &'a RetrievalConfig,
    pub generation: &'a GenerationConfig,
}

impl ChatService<'_> {
    /// One chat turn: auto-name a fresh generic thread, persist the
    /// question, answer it against the retrieved context and persist
    /// the answer with its measured generation latency.
    pub async fn send_message(&self, employee_id: &str, conversation: &str, question: &str) -> Result<ChatReply, AppError> {
        let threads = self.conversations.load(employee_id).await?;
        let existing: Vec<String> = threads.iter().map(|thread| thread.name.clone()).collect();
        let current = threads.iter().find(|thread| thread.name == conversation);
        let is_fresh = current.is_none_or(|thread| thread.messages.is_empty());

        let target = if is_generic_name(conversation) && is_fresh {
            unique_name(&derive_conversation_name(question), &existing)
        } else {
            conversation.to_string()
        };

        let history = match current {
            Some(thread) => build_history(&thread.messages, self.generation.history_limit),
            None => String::new(),
        };

        self.conversations.append(employee_id, &target, ChatRole::User, question, None).await?;

        let documents = self
            .index
            .search(question, self.retrieval.top_k, self.retrieval.score_threshold)
            .await?;
        let context = format_context(&documents);

        let started = Instant::now();
        let answer = self.generator.generate(question, &context, &history).await?;
        let response_time = started.elapsed().as_secs_f64();

        self.conversations
            .append(employee_id, &target, ChatRole::Assistant, &answer, Some(response_time))
            .await?;

        Ok(ChatReply {
            conversation: target,
            answer,
            response_time,
        })
    }
}
