//! Specialist Agent Port - Interface for clause extraction agents.
//!
//! A specialist turns contract text plus a clause category into an
//! `ExtractionResult`. Routed specialists, baselines and test doubles all
//! implement this trait; the orchestrator only ever sees `dyn SpecialistAgent`.

use async_trait::async_trait;

use crate::domain::extraction::{AgentConfig, ExtractionResult, ParseError, PromptError};

use super::ai_provider::AIError;

/// Port for clause extraction.
#[async_trait]
pub trait SpecialistAgent: Send + Sync {
    /// Extract clauses of `category` from `contract_text`.
    ///
    /// # Errors
    ///
    /// Returns `AgentError` only when no best-effort result can be produced,
    /// typically an unrecoverable provider failure.
    async fn extract(
        &self,
        contract_text: &str,
        category: &str,
        question: &str,
    ) -> Result<ExtractionResult, AgentError>;

    /// Static configuration of this agent.
    fn config(&self) -> &AgentConfig;

    /// Agent name, shorthand for `config().name()`.
    fn name(&self) -> &str {
        self.config().name()
    }
}

/// Errors raised by specialists and validators.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Provider(#[from] AIError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("{0}")]
    Other(String),
}

impl AgentError {
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}
