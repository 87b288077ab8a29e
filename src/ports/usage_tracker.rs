//! UsageTracker port - Interface for recording model call diagnostics.
//!
//! One `UsageRecord` is written per model invocation so token usage, cost
//! and latency can be compared across agents and models after a run.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::foundation::Timestamp;

use super::ai_provider::TokenUsage;

/// Record of a single model call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Agent that made the call.
    pub agent_name: String,
    /// Clause category being processed.
    pub category: String,
    /// Model identifier reported by the provider.
    pub model: String,
    /// Tokens in the prompt.
    pub prompt_tokens: u32,
    /// Tokens in the completion.
    pub completion_tokens: u32,
    /// Estimated cost in cents.
    pub cost_cents: u32,
    /// Wall-clock latency of the call.
    pub latency_ms: u64,
    /// Whether the call returned a completion.
    pub success: bool,
    /// Error message for failed calls.
    pub error: Option<String>,
    /// When the call finished.
    pub occurred_at: Timestamp,
}

impl UsageRecord {
    /// Record for a successful call.
    pub fn success(
        agent_name: impl Into<String>,
        category: impl Into<String>,
        model: impl Into<String>,
        usage: &TokenUsage,
        latency_ms: u64,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            category: category.into(),
            model: model.into(),
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            cost_cents: usage.estimated_cost_cents,
            latency_ms,
            success: true,
            error: None,
            occurred_at: Timestamp::now(),
        }
    }

    /// Record for a failed call.
    pub fn failure(
        agent_name: impl Into<String>,
        category: impl Into<String>,
        model: impl Into<String>,
        latency_ms: u64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            category: category.into(),
            model: model.into(),
            prompt_tokens: 0,
            completion_tokens: 0,
            cost_cents: 0,
            latency_ms,
            success: false,
            error: Some(error.into()),
            occurred_at: Timestamp::now(),
        }
    }

    /// Total tokens used.
    pub fn total_tokens(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Aggregated diagnostics over all recorded calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub total_calls: u32,
    pub successful_calls: u32,
    pub failed_calls: u32,
    /// `successful / total`; 0.0 with no calls.
    pub success_rate: f64,
    pub total_prompt_tokens: u64,
    pub total_completion_tokens: u64,
    pub total_cost_cents: u64,
    /// Mean latency of successful calls.
    pub avg_latency_ms: f64,
    pub by_model: BTreeMap<String, ModelUsage>,
    /// Call counts per agent.
    pub by_agent: BTreeMap<String, u32>,
}

/// Usage breakdown for one model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelUsage {
    pub calls: u32,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub cost_cents: u64,
    pub avg_latency_ms: f64,
}

/// Port for recording model usage.
#[async_trait]
pub trait UsageTracker: Send + Sync {
    /// Records a usage event.
    async fn record_usage(&self, record: UsageRecord) -> Result<(), UsageTrackerError>;

    /// Summarizes everything recorded so far.
    async fn summary(&self) -> Result<UsageSummary, UsageTrackerError>;
}

/// Errors from the usage tracker.
#[derive(Debug, thiserror::Error)]
pub enum UsageTrackerError {
    /// Storage failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Export failed.
    #[error("export failed: {0}")]
    Export(#[from] std::io::Error),

    /// Serialization failed.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
