//! OpenAI Provider - Implementation of AIProvider for the chat completions API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIConfig::new(api_key)
//!     .with_model("gpt-4o")
//!     .with_base_url("https://api.openai.com/v1");
//!
//! let provider = OpenAIProvider::new(config)?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, MessageRole,
    ProviderInfo, TokenUsage,
};

use super::retry_after_from_message;

/// Configuration for the OpenAI provider.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    api_key: Secret<String>,
    /// Default model when the request does not name one.
    pub model: String,
    /// Base URL for the API (default: https://api.openai.com/v1).
    pub base_url: String,
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
}

impl OpenAIConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(120),
            max_retries: 3,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenAI API provider implementation.
pub struct OpenAIProvider {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIProvider {
    /// Creates a new OpenAI provider.
    ///
    /// # Errors
    ///
    /// `AIError::InvalidRequest` if the HTTP client cannot be built.
    pub fn new(config: OpenAIConfig) -> Result<Self, AIError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AIError::InvalidRequest(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Converts our request to OpenAI's format.
    fn to_openai_request(&self, request: &CompletionRequest) -> OpenAIRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if let Some(ref prompt) = request.system_prompt {
            messages.push(OpenAIMessage {
                role: "system".to_string(),
                content: Some(prompt.clone()),
            });
        }

        for msg in &request.messages {
            messages.push(OpenAIMessage {
                role: match msg.role {
                    MessageRole::System => "system",
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                }
                .to_string(),
                content: Some(msg.content.clone()),
            });
        }

        OpenAIRequest {
            model: request.model.clone().unwrap_or_else(|| self.config.model.clone()),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    async fn send_request(&self, body: &OpenAIRequest) -> Result<Response, AIError> {
        self.client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AIError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    AIError::network(format!("Connection failed: {}", e))
                } else {
                    AIError::network(e.to_string())
                }
            })
    }

    async fn attempt(&self, body: &OpenAIRequest) -> Result<CompletionResponse, AIError> {
        let response = self.send_request(body).await?;
        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), &error_body));
        }

        let parsed: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;

        into_completion(parsed)
    }
}

fn status_error(status: u16, body: &str) -> AIError {
    match status {
        401 | 403 => AIError::AuthenticationFailed,
        429 => AIError::rate_limited(parse_retry_after(body)),
        400 if body.contains("maximum context length") || body.contains("context_length_exceeded") => {
            AIError::context_too_long(0, 0)
        }
        400 => AIError::InvalidRequest(body.to_string()),
        500..=599 => AIError::unavailable(format!("Server error {}: {}", status, body)),
        _ => AIError::network(format!("Unexpected status {}: {}", status, body)),
    }
}

fn parse_retry_after(error_body: &str) -> u32 {
    serde_json::from_str::<serde_json::Value>(error_body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(|m| m.as_str()).map(str::to_string))
        .and_then(|msg| retry_after_from_message(&msg))
        .unwrap_or(30)
}

fn into_completion(response: OpenAIResponse) -> Result<CompletionResponse, AIError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AIError::parse("No choices in response"))?;

    let finish_reason = match choice.finish_reason.as_deref() {
        Some("length") => FinishReason::Length,
        Some("content_filter") => FinishReason::ContentFilter,
        _ => FinishReason::Stop,
    };

    let usage = response
        .usage
        .map(|u| {
            TokenUsage::new(
                u.prompt_tokens,
                u.completion_tokens,
                calculate_cost(&response.model, u.prompt_tokens, u.completion_tokens),
            )
        })
        .unwrap_or_default();

    Ok(CompletionResponse {
        content: choice.message.content.unwrap_or_default(),
        usage,
        model: response.model,
        finish_reason,
    })
}

/// Estimated cost in cents for a model and token counts.
fn calculate_cost(model: &str, prompt_tokens: u32, completion_tokens: u32) -> u32 {
    // Cents per 1M tokens
    let (prompt_price, completion_price) = match model {
        m if m.starts_with("gpt-4o-mini") => (15, 60),
        m if m.starts_with("gpt-4o") => (250, 1000),
        m if m.starts_with("gpt-4-turbo") => (1000, 3000),
        m if m.starts_with("gpt-4") => (3000, 6000),
        m if m.starts_with("gpt-3.5") => (50, 150),
        _ => (250, 1000),
    };

    let prompt_cost = (prompt_tokens as u64 * prompt_price) / 1_000_000;
    let completion_cost = (completion_tokens as u64 * completion_price) / 1_000_000;

    (prompt_cost + completion_cost) as u32
}

#[async_trait]
impl AIProvider for OpenAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let body = self.to_openai_request(&request);
        let mut retry_count = 0;

        loop {
            match self.attempt(&body).await {
                Ok(completion) => return Ok(completion),
                Err(err) if err.is_retryable() && retry_count < self.config.max_retries => {
                    let delay = Duration::from_secs(1 << retry_count);
                    tracing::warn!(
                        provider = "openai",
                        agent = %request.metadata.agent_name,
                        attempt = retry_count + 1,
                        error = %err,
                        delay_secs = delay.as_secs(),
                        "retrying model call"
                    );
                    sleep(delay).await;
                    retry_count += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn estimate_tokens(&self, text: &str) -> u32 {
        // ~4 characters per token for English text
        (text.len() / 4).max(1) as u32
    }

    fn provider_info(&self) -> ProviderInfo {
        let max_context = match self.config.model.as_str() {
            m if m.starts_with("gpt-4o") || m.starts_with("gpt-4-turbo") => 128_000,
            m if m.starts_with("gpt-3.5") => 16_385,
            _ => 8_192,
        };

        ProviderInfo::new("openai", &self.config.model, max_context)
    }
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    model: String,
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::RequestMetadata;

    fn provider(model: &str) -> OpenAIProvider {
        OpenAIProvider::new(OpenAIConfig::new("test-key").with_model(model)).unwrap()
    }

    #[test]
    fn config_builder_works() {
        let config = OpenAIConfig::new("test-key")
            .with_model("gpt-4o-mini")
            .with_base_url("http://localhost:8080/v1")
            .with_max_retries(1);

        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn request_puts_system_prompt_first() {
        let provider = provider("gpt-4o");
        let request = CompletionRequest::new(RequestMetadata::new("zero_shot", "Insurance"))
            .with_system_prompt("Be precise")
            .with_message(MessageRole::User, "Contract");

        let body = provider.to_openai_request(&request);

        assert_eq!(body.model, "gpt-4o");
        assert_eq!(body.messages[0].role, "system");
        assert_eq!(body.messages[1].content.as_deref(), Some("Contract"));
        assert!(serde_json::to_value(&body).unwrap().get("max_tokens").is_none());
    }

    #[test]
    fn response_body_maps_to_completion() {
        let body = r#"{
            "model": "gpt-4o",
            "choices": [{"message": {"role": "assistant", "content": "No related clause."}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 1000000, "completion_tokens": 100000}
        }"#;

        let completion = into_completion(serde_json::from_str(body).unwrap()).unwrap();

        assert_eq!(completion.content, "No related clause.");
        assert_eq!(completion.finish_reason, FinishReason::Stop);
        assert_eq!(completion.usage.estimated_cost_cents, 350);
    }

    #[test]
    fn empty_choices_is_parse_error() {
        let body = r#"{"model": "gpt-4o", "choices": []}"#;
        let err = into_completion(serde_json::from_str(body).unwrap()).unwrap_err();
        assert!(matches!(err, AIError::Parse(_)));
    }

    #[test]
    fn status_errors_are_classified() {
        assert!(matches!(status_error(401, ""), AIError::AuthenticationFailed));
        assert!(matches!(
            status_error(400, "context_length_exceeded"),
            AIError::ContextTooLong { .. }
        ));
        assert!(status_error(503, "").is_retryable());
    }

    #[test]
    fn retry_after_defaults_to_thirty() {
        assert_eq!(parse_retry_after("not json"), 30);
        assert_eq!(
            parse_retry_after(r#"{"error":{"message":"Rate limit. Please try again in 20s."}}"#),
            20
        );
    }

    #[test]
    fn provider_info_context_window() {
        assert_eq!(provider("gpt-4o").provider_info().max_context_tokens, 128_000);
        assert_eq!(provider("gpt-3.5-turbo").provider_info().max_context_tokens, 16_385);
    }
}
