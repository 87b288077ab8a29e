//! Model invocation shared by every LLM-backed agent.
//!
//! Builds the completion request from an `AgentConfig`, times the call and
//! writes a `UsageRecord` when a tracker is attached.

use std::sync::Arc;
use std::time::Instant;

use crate::domain::extraction::AgentConfig;
use crate::ports::{
    AIError, AIProvider, CompletionRequest, MessageRole, RequestMetadata, UsageRecord, UsageTracker,
};

#[derive(Clone)]
pub(crate) struct ModelInvoker {
    provider: Arc<dyn AIProvider>,
    usage: Option<Arc<dyn UsageTracker>>,
}

impl ModelInvoker {
    pub(crate) fn new(provider: Arc<dyn AIProvider>) -> Self {
        Self {
            provider,
            usage: None,
        }
    }

    pub(crate) fn with_usage_tracker(mut self, tracker: Arc<dyn UsageTracker>) -> Self {
        self.usage = Some(tracker);
        self
    }

    /// Send one prompt and return the generated text.
    pub(crate) async fn invoke(
        &self,
        config: &AgentConfig,
        category: &str,
        system: Option<&str>,
        user: &str,
    ) -> Result<String, AIError> {
        let mut request = CompletionRequest::new(RequestMetadata::new(config.name(), category))
            .with_message(MessageRole::User, user)
            .with_model(&config.model)
            .with_temperature(config.temperature)
            .with_max_tokens(config.max_tokens);
        if let Some(system) = system.filter(|s| !s.trim().is_empty()) {
            request = request.with_system_prompt(system);
        }

        let started = Instant::now();
        let outcome = self.provider.complete(request).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        let record = match &outcome {
            Ok(response) => {
                tracing::debug!(
                    agent = config.name(),
                    category,
                    model = %response.model,
                    prompt_tokens = response.usage.prompt_tokens,
                    completion_tokens = response.usage.completion_tokens,
                    latency_ms,
                    "model call completed"
                );
                UsageRecord::success(config.name(), category, &response.model, &response.usage, latency_ms)
            }
            Err(err) => {
                tracing::warn!(agent = config.name(), category, error = %err, latency_ms, "model call failed");
                UsageRecord::failure(config.name(), category, &config.model, latency_ms, err.to_string())
            }
        };

        if let Some(tracker) = &self.usage {
            if let Err(err) = tracker.record_usage(record).await {
                tracing::warn!(agent = config.name(), error = %err, "failed to record usage");
            }
        }

        outcome.map(|response| response.content)
    }
}
