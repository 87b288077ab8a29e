//! Extraction results and agent descriptors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Output of any extraction or validation step.
///
/// An empty `extracted_clauses` means "no clause found". A missing result
/// (`Option::None` wherever one is expected) means no step produced output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Verbatim text spans, in the order they were reported.
    #[serde(default)]
    pub extracted_clauses: Vec<String>,
    /// Free-text explanation.
    #[serde(default)]
    pub reasoning: String,
    /// Recommended range [0, 1]; not enforced.
    #[serde(default)]
    pub confidence: f64,
    /// Indicator strings the agent matched.
    #[serde(default)]
    pub category_indicators_found: Vec<String>,
    /// Category this result pertains to.
    #[serde(default)]
    pub category: String,
    /// Share of extracted spans found verbatim in the contract (set by validators).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_rate: Option<f64>,
}

impl ExtractionResult {
    /// Creates an empty result for a category.
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            ..Default::default()
        }
    }

    /// Creates a "no clause" result carrying an explanation and zero confidence.
    pub fn empty(category: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self::new(category).with_reasoning(reasoning)
    }

    /// Sets the extracted clauses.
    pub fn with_clauses<I, S>(mut self, clauses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extracted_clauses = clauses.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the reasoning.
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    /// Sets the confidence.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Sets the matched indicators.
    pub fn with_indicators<I, S>(mut self, indicators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.category_indicators_found = indicators.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the grounding rate.
    pub fn with_grounding_rate(mut self, rate: f64) -> Self {
        self.grounding_rate = Some(rate);
        self
    }

    /// Returns true if no clause was found.
    pub fn is_empty(&self) -> bool {
        self.extracted_clauses.is_empty()
    }

    /// Number of extracted clauses.
    pub fn clause_count(&self) -> usize {
        self.extracted_clauses.len()
    }
}

/// Default model for agents that do not override it.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Default output token limit.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Static identity and capability descriptor for an agent.
///
/// `categories` is fixed at construction. An empty set accepts every
/// category (baselines). Model settings are passed through to the provider
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    name: String,
    categories: BTreeSet<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub prompt_name: Option<String>,
}

impl AgentConfig {
    /// Creates a config that accepts all categories.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            categories: BTreeSet::new(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: DEFAULT_MAX_TOKENS,
            prompt_name: None,
        }
    }

    /// Restricts the accepted categories.
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the output token limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the prompt template reference.
    pub fn with_prompt_name(mut self, prompt_name: impl Into<String>) -> Self {
        self.prompt_name = Some(prompt_name.into());
        self
    }

    /// Unique agent name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Accepted categories.
    pub fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    /// Check if this agent handles a category.
    pub fn handles_category(&self, category: &str) -> bool {
        self.categories.is_empty() || self.categories.contains(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_result_defaults() {
        let result = ExtractionResult::default();
        assert!(result.extracted_clauses.is_empty());
        assert_eq!(result.reasoning, "");
        assert_eq!(result.confidence, 0.0);
        assert!(result.grounding_rate.is_none());
    }

    #[test]
    fn populated_result_builder() {
        let result = ExtractionResult::new("Cap on Liability")
            .with_clauses(["clause 1", "clause 2"])
            .with_reasoning("Found two relevant clauses")
            .with_confidence(0.85)
            .with_indicators(["liability", "cap"]);

        assert_eq!(result.clause_count(), 2);
        assert_eq!(result.confidence, 0.85);
        assert_eq!(result.category, "Cap on Liability");
        assert_eq!(result.category_indicators_found, vec!["liability", "cap"]);
    }

    #[test]
    fn result_deserializes_with_missing_fields() {
        let result: ExtractionResult =
            serde_json::from_str(r#"{"extracted_clauses": ["a"]}"#).unwrap();
        assert_eq!(result.extracted_clauses, vec!["a"]);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.category, "");
    }

    #[test]
    fn grounding_rate_omitted_when_unset() {
        let json = serde_json::to_value(ExtractionResult::new("Insurance")).unwrap();
        assert!(json.get("grounding_rate").is_none());
    }

    #[test]
    fn default_agent_config() {
        let config = AgentConfig::new("test");
        assert_eq!(config.name(), "test");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.max_tokens, 4096);
        assert!(config.categories().is_empty());
    }

    #[test]
    fn empty_category_set_accepts_everything() {
        let config = AgentConfig::new("zero_shot_baseline");
        assert!(config.handles_category("Governing Law"));
        assert!(config.handles_category("anything"));
    }

    #[test]
    fn restricted_config_only_accepts_listed_categories() {
        let config = AgentConfig::new("custom")
            .with_categories(["cat1", "cat2"])
            .with_temperature(0.5)
            .with_max_tokens(8192);

        assert_eq!(config.categories().len(), 2);
        assert!(config.handles_category("cat1"));
        assert!(!config.handles_category("cat3"));
        assert_eq!(config.max_tokens, 8192);
    }
}
