//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Model Ports
//!
//! - `AIProvider` - LLM completion requests
//! - `UsageTracker` - Per-call token, cost and latency diagnostics
//!
//! ## Agent Ports
//!
//! - `SpecialistAgent` - Clause extraction for a category
//! - `ValidationAgent` - Grounding verification of an extraction

mod ai_provider;
mod specialist_agent;
mod usage_tracker;
mod validation_agent;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, Message, MessageRole,
    ProviderInfo, RequestMetadata, TokenUsage,
};
pub use specialist_agent::{AgentError, SpecialistAgent};
pub use usage_tracker::{ModelUsage, UsageRecord, UsageSummary, UsageTracker, UsageTrackerError};
pub use validation_agent::ValidationAgent;
