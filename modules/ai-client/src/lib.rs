pub mod error;
pub mod types;

pub use error::{AiError, Result};
pub use types::{ChatMessage, ChatRequest, ChatResponse, Choice};

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

const CEREBRAS_API_URL: &str = "https://api.cerebras.ai/v1";

const DEFAULT_MODEL: &str = "llama-4-scout-17b-16e-instruct";

/// Generation parameters are fixed: the digest format leaves no room
/// for tuning per request.
const MAX_COMPLETION_TOKENS: u32 = 300;
const COMPLETION_TEMPERATURE: f32 = 0.3;

/// A text-completion backend that returns one full, non-streamed
/// result for a system instruction plus user message.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

pub struct CerebrasClient {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl CerebrasClient {
    pub fn new(api_key: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            api_key: api_key.to_string(),
            http,
            base_url: CEREBRAS_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %request.model, "Cerebras chat request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl CompletionBackend for CerebrasClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            max_tokens: MAX_COMPLETION_TOKENS,
            temperature: COMPLETION_TEMPERATURE,
            stream: false,
        };

        let response = self.chat(&request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .ok_or(AiError::EmptyResponse)
    }
}
