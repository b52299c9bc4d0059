//! Conversational fallback
//!
//! Anything the router and the search heuristic leave alone is sent to a
//! hosted chat model. Backends are stateless per call: the assistant owns the
//! history and passes the trimmed tail in with every request.

use serde::{Deserialize, Serialize};

use crate::config::ChatConfig;
use crate::error::ChatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

pub fn system_prompt(name: &str) -> String {
    format!(
        "You are {name}, an AI desktop automation assistant. \
         You communicate strictly in English only. \
         Respond concisely and helpfully, in plain sentences that read well aloud. \
         When users ask questions, provide clear English answers. \
         Do not show JSON, code, or internal reasoning - just the final reply."
    )
}

/// Trait for chat completion backends
pub trait ChatBackend: Send {
    /// One completion over `messages`; no state is kept between calls
    fn converse(&mut self, messages: &[Message], max_tokens: u32) -> Result<String, ChatError>;

    fn name(&self) -> &str;
}

// ============================================================================
// OpenAI-compatible backend (Groq, OpenAI, LM Studio, Ollama)
// ============================================================================

#[cfg(feature = "openai-compat")]
pub mod openai_compat {
    use std::time::Instant;

    use serde::{Deserialize, Serialize};
    use tracing::{debug, info};

    use super::{ChatBackend, Message};
    use crate::error::ChatError;

    #[derive(Serialize)]
    struct CompletionRequest<'a> {
        model: &'a str,
        messages: &'a [Message],
        max_tokens: u32,
        temperature: f32,
        top_p: f32,
    }

    #[derive(Deserialize)]
    struct CompletionResponse {
        choices: Vec<Choice>,
    }

    #[derive(Deserialize)]
    struct Choice {
        message: ChoiceMessage,
    }

    #[derive(Deserialize)]
    struct ChoiceMessage {
        #[serde(default)]
        content: Option<String>,
    }

    pub struct OpenAiCompatBackend {
        client: reqwest::blocking::Client,
        endpoint: String,
        model: String,
        api_key: Option<String>,
        temperature: f32,
        top_p: f32,
    }

    impl OpenAiCompatBackend {
        pub fn new(
            base_url: &str,
            model: &str,
            api_key: Option<String>,
            temperature: f32,
            top_p: f32,
        ) -> Self {
            info!(base_url, model, has_key = api_key.is_some(), "chat backend ready");
            Self {
                client: reqwest::blocking::Client::new(),
                endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
                model: model.to_string(),
                api_key,
                temperature,
                top_p,
            }
        }

        pub fn endpoint(&self) -> &str {
            &self.endpoint
        }
    }

    impl ChatBackend for OpenAiCompatBackend {
        #[hotpath::measure]
        fn converse(&mut self, messages: &[Message], max_tokens: u32) -> Result<String, ChatError> {
            let body = CompletionRequest {
                model: &self.model,
                messages,
                max_tokens,
                temperature: self.temperature,
                top_p: self.top_p,
            };

            let started = Instant::now();
            let mut request = self.client.post(&self.endpoint).json(&body);
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            let response = request
                .send()
                .map_err(|e| ChatError::Request(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().unwrap_or_default();
                return Err(ChatError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            let parsed: CompletionResponse = response
                .json()
                .map_err(|e| ChatError::Request(e.to_string()))?;
            debug!(elapsed_ms = started.elapsed().as_millis() as u64, "chat completion");

            parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .ok_or(ChatError::EmptyResponse)
        }

        fn name(&self) -> &str {
            &self.model
        }
    }
}

/// Build the configured backend; `None` when chat is disabled
pub fn from_config(config: &ChatConfig) -> Result<Option<Box<dyn ChatBackend>>, ChatError> {
    match config {
        ChatConfig::Disabled => Ok(None),
        #[cfg(feature = "openai-compat")]
        ChatConfig::OpenAiCompat {
            base_url,
            preset,
            model,
            api_key,
            temperature,
            top_p,
            ..
        } => {
            let needs_key = matches!(preset.as_deref(), Some("groq") | Some("openai"));
            if needs_key && api_key.is_none() {
                return Err(ChatError::MissingApiKey(
                    preset.clone().unwrap_or_default(),
                ));
            }
            Ok(Some(Box::new(openai_compat::OpenAiCompatBackend::new(
                base_url,
                model,
                api_key.clone(),
                *temperature,
                *top_p,
            ))))
        }
        #[cfg(not(feature = "openai-compat"))]
        ChatConfig::OpenAiCompat { .. } => Err(ChatError::Request(
            "OpenAI-compatible backend not enabled. Build with --features openai-compat".into(),
        )),
    }
}

/// Replays canned replies in order and records every request
#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    replies: std::collections::VecDeque<Result<String, String>>,
    requests: Vec<Vec<Message>>,
}

#[cfg(any(test, feature = "testing"))]
impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, text: impl Into<String>) -> Self {
        self.replies.push_back(Ok(text.into()));
        self
    }

    pub fn fail(mut self, message: impl Into<String>) -> Self {
        self.replies.push_back(Err(message.into()));
        self
    }

    pub fn requests(&self) -> &[Vec<Message>] {
        &self.requests
    }
}

#[cfg(any(test, feature = "testing"))]
impl ChatBackend for ScriptedBackend {
    fn converse(&mut self, messages: &[Message], _max_tokens: u32) -> Result<String, ChatError> {
        self.requests.push(messages.to_vec());
        match self.replies.pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(ChatError::Request(message)),
            None => Err(ChatError::EmptyResponse),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "openai-compat")]
    #[test]
    fn test_message_serializes_openai_shape() {
        let json = serde_json::to_string(&Message::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }

    #[test]
    fn test_system_prompt_names_assistant() {
        assert!(system_prompt("Nova").starts_with("You are Nova"));
    }

    #[test]
    fn test_disabled_config_builds_nothing() {
        assert!(from_config(&ChatConfig::Disabled).unwrap().is_none());
    }

    #[test]
    fn test_groq_without_key_is_rejected() {
        let config = ChatConfig::OpenAiCompat {
            base_url: "https://api.groq.com/openai/v1".into(),
            preset: Some("groq".into()),
            model: "llama-3.1-8b-instant".into(),
            api_key: None,
            temperature: 0.7,
            top_p: 1.0,
            max_tokens: 220,
            history_turns: 10,
        };
        assert!(matches!(
            from_config(&config),
            Err(ChatError::MissingApiKey(_))
        ));
    }

    #[test]
    fn test_scripted_backend() {
        let mut chat = ScriptedBackend::new().reply("first").fail("offline");
        assert_eq!(chat.converse(&[Message::user("a")], 10).unwrap(), "first");
        assert!(chat.converse(&[Message::user("b")], 10).is_err());
        assert!(matches!(
            chat.converse(&[], 10),
            Err(ChatError::EmptyResponse)
        ));
        assert_eq!(chat.requests().len(), 3);
    }

    #[cfg(feature = "openai-compat")]
    #[test]
    fn test_endpoint_joins_base_url() {
        let backend =
            openai_compat::OpenAiCompatBackend::new("http://localhost:1234/v1/", "m", None, 0.7, 1.0);
        assert_eq!(backend.endpoint(), "http://localhost:1234/v1/chat/completions");
    }
}
