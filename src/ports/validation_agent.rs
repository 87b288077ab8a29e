//! Validation Agent Port - Interface for post-extraction verification.

use async_trait::async_trait;

use crate::domain::extraction::ExtractionResult;

use super::specialist_agent::AgentError;

/// Port for checking a specialist's output against the source contract.
///
/// Implementations may drop ungrounded spans or add newly found grounded
/// ones, and report `grounding_rate` on the returned result.
#[async_trait]
pub trait ValidationAgent: Send + Sync {
    async fn verify(
        &self,
        result: &ExtractionResult,
        contract_text: &str,
        category: &str,
    ) -> Result<ExtractionResult, AgentError>;

    /// Name used in logs.
    fn name(&self) -> &str {
        "validator"
    }
}
