use crate::config::GenerationConfig;
use crate::error::app_error::AppError;
use serde::{Deserialize, Serialize};

/// Handle shared with request handlers through Rocket's managed state.
pub type SharedGenerator = std::sync::Arc<dyn AnswerGenerator>;

/// The language-model call. Callers measure wall-clock latency around
/// `generate` and store it as the message's response time; nothing of
/// the model's internals leaks through this interface.
#[async_trait::async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, question: &str, context: &str, history: &str) -> Result<String, AppError>;
}

/// Client for an OpenAI-compatible chat-completions endpoint.
pub struct HttpGenerator {
    client: reqwest::Client,
    config: GenerationConfig,
}

impl HttpGenerator {
    pub fn new(config: GenerationConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<CompletionMessage<'a>>,
}

#[derive(Serialize)]
struct CompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionChoiceMessage,
}

#[derive(Deserialize)]
struct CompletionChoiceMessage {
    content: Option<String>,
}

fn system_prompt(context: &str, history: &str) -> String {
    format!(
        "Tu es un assistant interne qui répond aux questions des employés \
         en t'appuyant uniquement sur les extraits de documents fournis. \
         Si les extraits ne permettent pas de répondre, dis-le.\n\n\
         Extraits :\n{context}\n\nHistorique :\n{history}"
    )
}

#[async_trait::async_trait]
impl AnswerGenerator for HttpGenerator {
    async fn generate(&self, question: &str, context: &str, history: &str) -> Result<String, AppError> {
        let prompt = system_prompt(context, history);
        let request = CompletionRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            messages: vec![
                CompletionMessage {
                    role: "system",
                    content: &prompt,
                },
                CompletionMessage {
                    role: "user",
                    content: question,
                },
            ],
        };

        let mut builder = self.client.post(&self.config.url).json(&request);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response: CompletionResponse = builder.send().await?.error_for_status()?.json().await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::generation("completion returned no content"))
    }
}

#[cfg(test)]
mod tests {
    use super::system_prompt;

    #[test]
    fn prompt_embeds_context_and_history() {
        let prompt = system_prompt("extrait A", "Utilisateur : bonjour");
        assert!(prompt.contains("extrait A"));
        assert!(prompt.contains("Utilisateur : bonjour"));
    }
}
