//! Chat-completion classifier client
//!
//! Same transport envelope as the catalog client: bounded timeout,
//! fixed retry budget with doubling backoff, 5xx and transport errors
//! retryable. Classification responses are parsed as strict JSON; the
//! intent string goes through `QueryIntent::decode` so the model can
//! never extend the intent set.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use shop_agent_config::Settings;
use shop_agent_core::{
    CatalogEntity, Classification, ClassifierClient, Error, QueryIntent, ResponseInstruction,
    Result,
};

use crate::prompt::{instruction_facts, Message, PromptBuilder};
use crate::ClassifierError;

/// Classifier client configuration
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Model name
    pub model: String,
    /// Chat endpoint base URL
    pub endpoint: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retry attempts after the first failure
    pub max_retries: u32,
    /// Initial backoff, doubling per retry
    pub initial_backoff: Duration,
    /// Sampling temperature; classification runs at 0.0 regardless
    pub temperature: f32,
    /// Token cap for rendered replies
    pub max_tokens: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model: "qwen2.5:7b-instruct-q4_K_M".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            timeout: Duration::from_secs(8),
            max_retries: 2,
            initial_backoff: Duration::from_millis(200),
            temperature: 0.4,
            max_tokens: 160,
        }
    }
}

impl ClassifierConfig {
    /// Build from loaded settings: the engine's call envelope governs
    /// every collaborator.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            model: settings.endpoints.model.clone(),
            endpoint: settings.endpoints.classifier_url.clone(),
            timeout: settings.engine.call_timeout(),
            max_retries: settings.engine.max_retries,
            initial_backoff: settings.engine.initial_backoff(),
            ..Self::default()
        }
    }
}

/// Chat-completion classifier and renderer
#[derive(Clone)]
pub struct LlmClassifier {
    client: Client,
    config: ClassifierConfig,
}

impl LlmClassifier {
    pub fn new(config: ClassifierConfig) -> std::result::Result<Self, ClassifierError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ClassifierError::Configuration(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.config.endpoint, path)
    }

    async fn execute_request(
        &self,
        request: &ChatRequest,
    ) -> std::result::Result<ChatResponse, ClassifierError> {
        let response = self
            .client
            .post(self.api_url("/chat"))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                return Err(ClassifierError::Server(format!("{status}: {body}")));
            }
            return Err(ClassifierError::Api(format!("{status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| ClassifierError::InvalidResponse(e.to_string()))
    }

    fn is_retryable(error: &ClassifierError) -> bool {
        matches!(
            error,
            ClassifierError::Network(_) | ClassifierError::Server(_) | ClassifierError::Timeout
        )
    }

    async fn chat(
        &self,
        messages: Vec<Message>,
        temperature: f32,
    ) -> std::result::Result<String, ClassifierError> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(ChatMessage::from).collect(),
            stream: false,
            options: ChatOptions {
                temperature,
                num_predict: self.config.max_tokens as i32,
            },
        };

        let mut last_error = None;
        let mut backoff = self.config.initial_backoff;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::warn!(
                    attempt,
                    max = self.config.max_retries,
                    "classifier request failed, retrying in {backoff:?}"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            match self.execute_request(&request).await {
                Ok(response) => return Ok(response.message.content),
                Err(e) if Self::is_retryable(&e) => {
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| ClassifierError::Network("max retries exceeded".to_string())))
    }
}

#[async_trait]
impl ClassifierClient for LlmClassifier {
    async fn classify(
        &self,
        message: &str,
        recent_history: &[(String, String)],
        grounded_entity: Option<&CatalogEntity>,
    ) -> Result<Classification> {
        let messages = PromptBuilder::new()
            .classification_prompt(grounded_entity)
            .with_history(recent_history)
            .user_message(message)
            .build();

        let raw = self.chat(messages, 0.0).await.map_err(into_core)?;
        let classification = parse_classification(&raw)?;
        tracing::debug!(intent = %classification.intent, "message classified");
        Ok(classification)
    }

    async fn render(
        &self,
        instruction: &ResponseInstruction,
        recent_history: &[(String, String)],
    ) -> Result<String> {
        let facts = instruction_facts(instruction);
        let messages = PromptBuilder::new()
            .rendering_prompt(&facts)
            .with_history(recent_history)
            .user_message("Write the reply now.")
            .build();

        let text = self
            .chat(messages, self.config.temperature)
            .await
            .map_err(into_core)?;
        Ok(text.trim().to_string())
    }
}

fn into_core(error: ClassifierError) -> Error {
    match error {
        ClassifierError::Timeout => Error::CollaboratorTimeout {
            collaborator: "classifier",
        },
        other => Error::unavailable("classifier", other.to_string()),
    }
}

/// Parse the model's classification JSON. Tolerates prose around the
/// object by slicing the outermost braces; a missing or unparseable
/// object is a boundary error, not a panic.
fn parse_classification(raw: &str) -> Result<Classification> {
    let start = raw.find('{');
    let end = raw.rfind('}');
    let json = match (start, end) {
        (Some(s), Some(e)) if e > s => &raw[s..=e],
        _ => {
            return Err(Error::InvalidClassifierOutput(format!(
                "no JSON object in classifier output: {raw:?}"
            )))
        }
    };

    let wire: ClassificationDto = serde_json::from_str(json)
        .map_err(|e| Error::InvalidClassifierOutput(format!("{e}: {json:?}")))?;

    Ok(Classification {
        intent: QueryIntent::decode(wire.intent.as_deref().unwrap_or_default()),
        extracted_term: non_empty(wire.extracted_term),
        code: non_empty(wire.code),
        id: non_empty(wire.id),
        attribute: non_empty(wire.attribute),
        attribute_value: non_empty(wire.attribute_value),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// Chat API wire types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl From<&Message> for ChatMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.to_string(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
    num_predict: i32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ClassificationDto {
    #[serde(default)]
    intent: Option<String>,
    #[serde(default)]
    extracted_term: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    attribute: Option<String>,
    #[serde(default)]
    attribute_value: Option<String>,
}
