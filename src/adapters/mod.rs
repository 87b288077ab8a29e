//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Model providers (Anthropic, OpenAI, mock) and usage tracking
//! - `agents` - Specialists, baselines, grounding validator and prompt library

pub mod agents;
pub mod ai;
