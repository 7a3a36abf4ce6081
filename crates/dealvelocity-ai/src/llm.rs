//! Chat-completion seam: the [`ChatModel`] trait and its OpenAI-compatible HTTP client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AnalyzerConfig;
use crate::error::AiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
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
}

/// One chat-completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Ask the endpoint for a single JSON object as output.
    pub json_mode: bool,
}

impl ChatRequest {
    /// System + user exchange expecting a JSON object back.
    pub fn json(model: &str, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            json_mode: true,
        }
    }

    /// System + user exchange expecting free text back.
    pub fn text(model: &str, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            json_mode: false,
            ..Self::json(model, system, user)
        }
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
    }

    pub fn user_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

/// A language model reachable through chat completions.
///
/// Returns the content of the first choice. Blank content is
/// [`AiError::EmptyResponse`].
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String, AiError>;
}

/// Chat-completions client for OpenAI and API-compatible endpoints.
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    /// Build a client from validated configuration.
    pub fn new(config: &AnalyzerConfig) -> Result<Self, AiError> {
        config.validate()?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, AiError> {
        let body = CompletionBody {
            model: &request.model,
            messages: &request.messages,
            response_format: request
                .json_mode
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        debug!(model = %request.model, json = request.json_mode, "chat completion request");
        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AiError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        decode_completion(&body)
    }
}

/// Decode a 2xx completion body. An undecodable body is [`AiError::Json`].
fn decode_completion(body: &str) -> Result<String, AiError> {
    let completion: CompletionResponse = serde_json::from_str(body)?;
    first_content(completion)
}

fn first_content(completion: CompletionResponse) -> Result<String, AiError> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or(AiError::EmptyResponse)
}
