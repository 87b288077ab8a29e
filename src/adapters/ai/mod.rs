//! AI Provider Adapters.
//!
//! Implementations of the AIProvider and UsageTracker ports.
//!
//! ## Available Adapters
//!
//! - `MockAIProvider` - Scripted provider for tests
//! - `AnthropicProvider` - Anthropic Claude models
//! - `OpenAIProvider` - OpenAI chat completion models
//! - `InMemoryUsageTracker` - Per-call diagnostics with JSON export

mod anthropic_provider;
mod in_memory_usage_tracker;
mod mock_provider;
mod openai_provider;

pub use anthropic_provider::{AnthropicConfig, AnthropicProvider};
pub use in_memory_usage_tracker::InMemoryUsageTracker;
pub use mock_provider::{MockAIProvider, MockResponse};
pub use openai_provider::{OpenAIConfig, OpenAIProvider};

/// Reads the seconds out of a "try again in 12s" style message.
pub(crate) fn retry_after_from_message(message: &str) -> Option<u32> {
    let idx = message.find("try again in ")?;
    let rest = &message[idx + "try again in ".len()..];
    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    rest[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_after_parses_seconds() {
        assert_eq!(retry_after_from_message("Please try again in 7s."), Some(7));
        assert_eq!(retry_after_from_message("try again in 42"), Some(42));
        assert_eq!(retry_after_from_message("try again later"), None);
    }
}
