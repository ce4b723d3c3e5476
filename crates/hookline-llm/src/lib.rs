use std::env;
use std::future::Future;
use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use hookline_types::ModelClass;

/// A fully assembled generation request, backend-agnostic. The engine builds
/// one per call; the client maps the model class onto a concrete model id.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model_class: ModelClass,
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("backend response missing content")]
    EmptyResponse,
}

/// The generative backend seam. Constructed explicitly and injected into the
/// engine so tests can script it; there is no process-global client.
pub trait GenerativeBackend: Send + Sync {
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<String, BackendError>> + Send;
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub api_base: String,
    pub draft_model: String,
    pub premium_model: String,
    pub timeout: Duration,
}

impl LlmConfig {
    /// Reads the backend configuration from the environment. Returns `None`
    /// when no API key is present, so callers can fail with a clear message.
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("HOOKLINE_LLM_API_KEY").ok()?;
        let api_base = env::var("HOOKLINE_LLM_API_BASE")
            .unwrap_or_else(|_| "https://api.x.ai/v1".to_string());
        let draft_model =
            env::var("HOOKLINE_DRAFT_MODEL").unwrap_or_else(|_| "grok-3-mini".to_string());
        let premium_model =
            env::var("HOOKLINE_PREMIUM_MODEL").unwrap_or_else(|_| "grok-3".to_string());
        let timeout_secs = env::var("HOOKLINE_LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);
        Some(Self {
            api_key,
            api_base,
            draft_model,
            premium_model,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Chat-completions client over HTTP with a hard request timeout.
#[derive(Clone)]
pub struct HttpLlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl HttpLlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    fn model_for(&self, class: ModelClass) -> &str {
        match class {
            ModelClass::Draft => &self.config.draft_model,
            ModelClass::Premium => &self.config.premium_model,
        }
    }
}

impl GenerativeBackend for HttpLlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError> {
        let url = format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );
        let model = self.model_for(request.model_class);
        debug!(model, "dispatching completion request");

        let body = ChatRequest {
            model: model.to_string(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.user_prompt.clone(),
                },
            ],
        };

        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                detail: detail.trim().to_string(),
            });
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .first()
            .map(|choice| choice.message.content.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(BackendError::EmptyResponse);
        }

        Ok(content)
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}
