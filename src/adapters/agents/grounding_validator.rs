//! Grounding validator.
//!
//! Drops extracted spans that do not occur in the contract (modulo
//! whitespace) and reports the grounding rate. With a provider attached it
//! also re-checks empty results once for clauses the specialist missed.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::extraction::{
    AgentConfig, ExtractionResult, GroundingIndex, PromptTemplate, ResponseParser,
};
use crate::ports::{AIProvider, AgentError, UsageTracker, ValidationAgent};

use super::invoker::ModelInvoker;

const RECHECK_PROMPT: &str = r#"You are a validation agent responsible for verifying contract clause extractions.

The extraction agent reported that the contract contains no clause related to the category below.
Search the contract again for any potentially relevant clauses that might have been missed.
Quote clauses exactly as they appear in the contract.

ORIGINAL CONTRACT:
{contract_text}

CATEGORY: {category}

Respond with a JSON object containing:
- missed_clauses: list of clauses found during re-check (empty if none)
- validation_notes: string explaining what you found
"#;

#[derive(Debug, Default, Deserialize)]
struct RecheckResponse {
    #[serde(default)]
    missed_clauses: Vec<String>,
    #[serde(default)]
    validation_notes: String,
}

/// Validation agent enforcing verbatim grounding.
pub struct GroundingValidator {
    config: AgentConfig,
    recheck: Option<ModelInvoker>,
    template: PromptTemplate,
    parser: ResponseParser,
}

impl Default for GroundingValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl GroundingValidator {
    /// Deterministic validator without model calls.
    pub fn new() -> Self {
        Self {
            config: AgentConfig::new("validation"),
            recheck: None,
            template: PromptTemplate::new("validation_recheck", "", RECHECK_PROMPT)
                .with_variables(["contract_text", "category"]),
            parser: ResponseParser::new(),
        }
    }

    /// Enables the model re-check of empty results.
    pub fn with_recheck(mut self, provider: Arc<dyn AIProvider>) -> Self {
        self.recheck = Some(ModelInvoker::new(provider));
        self
    }

    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Records re-check calls. No effect without `with_recheck`.
    pub fn with_usage_tracker(mut self, tracker: Arc<dyn UsageTracker>) -> Self {
        self.recheck = self.recheck.map(|invoker| invoker.with_usage_tracker(tracker));
        self
    }

    pub fn rechecks_enabled(&self) -> bool {
        self.recheck.is_some()
    }

    async fn find_missed(
        &self,
        invoker: &ModelInvoker,
        index: &GroundingIndex,
        contract_text: &str,
        category: &str,
    ) -> Result<(Vec<String>, String), AgentError> {
        let vars = HashMap::from([("contract_text", contract_text), ("category", category)]);
        let prompt = self.template.format(&vars)?;
        let response = invoker.invoke(&self.config, category, None, &prompt.user).await?;

        let recheck: RecheckResponse = match self.parser.extract_json(&response) {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|err| {
                tracing::debug!(category, error = %err, "unparseable recheck response");
                RecheckResponse::default()
            }),
            None => RecheckResponse::default(),
        };

        let found = recheck.missed_clauses.len();
        let grounded = index.check(&recheck.missed_clauses).grounded;
        tracing::debug!(category, found, grounded = grounded.len(), "recheck completed");

        Ok((grounded, recheck.validation_notes))
    }
}

#[async_trait]
impl ValidationAgent for GroundingValidator {
    async fn verify(
        &self,
        result: &ExtractionResult,
        contract_text: &str,
        category: &str,
    ) -> Result<ExtractionResult, AgentError> {
        let index = GroundingIndex::new(contract_text);
        let report = index.check(&result.extracted_clauses);
        let rate = report.rate();

        let mut notes = Vec::new();
        if !report.ungrounded.is_empty() {
            let removed = report
                .ungrounded
                .iter()
                .map(|clause| format!("{:?}", clause))
                .collect::<Vec<_>>()
                .join(", ");
            notes.push(format!(
                "Removed {} ungrounded clause(s): {}",
                report.ungrounded.len(),
                removed
            ));
        }

        let mut clauses = report.grounded;
        if result.is_empty() {
            if let Some(invoker) = &self.recheck {
                let (missed, recheck_notes) =
                    self.find_missed(invoker, &index, contract_text, category).await?;
                if !missed.is_empty() {
                    notes.push(format!("Recheck found {} missed clause(s)", missed.len()));
                }
                if !recheck_notes.trim().is_empty() {
                    notes.push(recheck_notes.trim().to_string());
                }
                clauses.extend(missed);
            }
        }

        let reasoning = match (result.reasoning.is_empty(), notes.is_empty()) {
            (_, true) => result.reasoning.clone(),
            (true, false) => format!("Validation: {}", notes.join("; ")),
            (false, false) => format!("{}\n\nValidation: {}", result.reasoning, notes.join("; ")),
        };

        Ok(ExtractionResult {
            extracted_clauses: clauses,
            reasoning,
            grounding_rate: Some(rate),
            ..result.clone()
        })
    }

    fn name(&self) -> &str {
        self.config.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAIProvider;
    use crate::ports::AIError;

    const CONTRACT: &str = "Licensee shall maintain general liability insurance\nof at least $1,000,000.\n\nThis Agreement is governed by New York law.";

    fn result(clauses: &[&str]) -> ExtractionResult {
        ExtractionResult::new("Insurance")
            .with_clauses(clauses.iter().copied())
            .with_reasoning("specialist reasoning")
            .with_confidence(0.9)
    }

    #[tokio::test]
    async fn keeps_grounded_and_removes_invented_spans() {
        let validator = GroundingValidator::new();
        let input = result(&[
            "Licensee shall maintain general liability insurance of at least $1,000,000.",
            "Licensee must carry cyber insurance.",
        ]);

        let output = validator.verify(&input, CONTRACT, "Insurance").await.unwrap();

        assert_eq!(output.extracted_clauses, vec![input.extracted_clauses[0].clone()]);
        assert_eq!(output.grounding_rate, Some(0.5));
        assert_eq!(output.confidence, 0.9);
        assert_eq!(output.category, "Insurance");
        assert!(output.reasoning.starts_with("specialist reasoning\n\nValidation: Removed 1"));
        assert!(output.reasoning.contains("cyber insurance"));
    }

    #[tokio::test]
    async fn fully_grounded_result_is_unchanged_apart_from_rate() {
        let validator = GroundingValidator::new();
        let input = result(&["governed by New York law."]);

        let output = validator.verify(&input, CONTRACT, "Governing Law").await.unwrap();

        assert_eq!(output.extracted_clauses, input.extracted_clauses);
        assert_eq!(output.reasoning, "specialist reasoning");
        assert_eq!(output.grounding_rate, Some(1.0));
    }

    #[tokio::test]
    async fn empty_result_has_rate_one_without_recheck() {
        let validator = GroundingValidator::new();

        let output = validator.verify(&result(&[]), CONTRACT, "Insurance").await.unwrap();

        assert!(output.is_empty());
        assert_eq!(output.grounding_rate, Some(1.0));
        assert!(!validator.rechecks_enabled());
    }

    #[tokio::test]
    async fn recheck_appends_only_grounded_missed_clauses() {
        let provider = Arc::new(MockAIProvider::new().with_response(
            r#"{"missed_clauses": ["Licensee shall maintain general liability insurance of at least $1,000,000.", "Invented clause."], "validation_notes": "found one"}"#,
        ));
        let validator = GroundingValidator::new().with_recheck(provider.clone());

        let output = validator.verify(&result(&[]), CONTRACT, "Insurance").await.unwrap();

        assert_eq!(
            output.extracted_clauses,
            vec!["Licensee shall maintain general liability insurance of at least $1,000,000."]
        );
        assert_eq!(output.grounding_rate, Some(1.0));
        assert!(output.reasoning.contains("Recheck found 1 missed clause(s); found one"));
        assert!(provider.get_calls()[0].messages[0].content.contains("CATEGORY: Insurance"));
    }

    #[tokio::test]
    async fn recheck_skipped_when_result_has_clauses() {
        let provider = Arc::new(MockAIProvider::new());
        let validator = GroundingValidator::new().with_recheck(provider.clone());

        validator
            .verify(&result(&["governed by New York law."]), CONTRACT, "Governing Law")
            .await
            .unwrap();

        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn recheck_provider_failure_is_an_error() {
        let provider = Arc::new(MockAIProvider::new().with_error(AIError::unavailable("down")));
        let validator = GroundingValidator::new().with_recheck(provider);

        let err = validator.verify(&result(&[]), CONTRACT, "Insurance").await.unwrap_err();

        assert!(matches!(err, AgentError::Provider(AIError::Unavailable { .. })));
    }

    #[tokio::test]
    async fn unparseable_recheck_adds_nothing() {
        let provider = Arc::new(MockAIProvider::new().with_response("I could not find anything."));
        let validator = GroundingValidator::new().with_recheck(provider);

        let output = validator.verify(&result(&[]), CONTRACT, "Insurance").await.unwrap();

        assert!(output.is_empty());
        assert_eq!(output.reasoning, "specialist reasoning");
    }
}
