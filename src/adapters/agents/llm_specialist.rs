//! LLM-backed routed specialist.
//!
//! One type serves all three routed specialists; they differ only in
//! identity, accepted categories and prompt template.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::extraction::{
    AgentConfig, ExtractionResult, PromptError, PromptTemplate, ResponseParser, SpecialistId,
};
use crate::ports::{AIProvider, AgentError, SpecialistAgent, UsageTracker};

use super::invoker::ModelInvoker;
use super::prompt_library::PromptLibrary;

/// Specialist that prompts a model with category indicators and parses a
/// JSON extraction out of the answer.
pub struct LlmSpecialist {
    id: SpecialistId,
    config: AgentConfig,
    template: PromptTemplate,
    invoker: ModelInvoker,
    parser: ResponseParser,
}

impl LlmSpecialist {
    /// Creates a specialist with the default config for `id`.
    pub fn new(id: SpecialistId, provider: Arc<dyn AIProvider>, template: PromptTemplate) -> Self {
        let config = AgentConfig::new(id.as_str())
            .with_categories(id.categories().iter().copied())
            .with_prompt_name(template.name.clone());

        Self {
            id,
            config,
            template,
            invoker: ModelInvoker::new(provider),
            parser: ResponseParser::new(),
        }
    }

    pub fn risk_liability(provider: Arc<dyn AIProvider>, template: PromptTemplate) -> Self {
        Self::new(SpecialistId::RiskLiability, provider, template)
    }

    pub fn temporal_renewal(provider: Arc<dyn AIProvider>, template: PromptTemplate) -> Self {
        Self::new(SpecialistId::TemporalRenewal, provider, template)
    }

    pub fn ip_commercial(provider: Arc<dyn AIProvider>, template: PromptTemplate) -> Self {
        Self::new(SpecialistId::IpCommercial, provider, template)
    }

    /// Creates a specialist using the library's template for `id`.
    pub fn from_library(
        id: SpecialistId,
        provider: Arc<dyn AIProvider>,
        library: &PromptLibrary,
    ) -> Result<Self, PromptError> {
        let template = library.for_specialist(id)?.clone();
        Ok(Self::new(id, provider, template))
    }

    /// Overrides model settings. Name and categories stay those of the specialist.
    pub fn with_model_settings(mut self, model: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        self.config = self
            .config
            .with_model(model)
            .with_temperature(temperature)
            .with_max_tokens(max_tokens);
        self
    }

    pub fn with_usage_tracker(mut self, tracker: Arc<dyn UsageTracker>) -> Self {
        self.invoker = self.invoker.with_usage_tracker(tracker);
        self
    }

    pub fn id(&self) -> SpecialistId {
        self.id
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }
}

#[async_trait]
impl SpecialistAgent for LlmSpecialist {
    async fn extract(
        &self,
        contract_text: &str,
        category: &str,
        question: &str,
    ) -> Result<ExtractionResult, AgentError> {
        if !self.config.handles_category(category) {
            tracing::debug!(specialist = %self.id, category, "category outside specialist table");
        }

        let indicators = self.template.format_indicators(category);
        let vars = HashMap::from([
            ("category", category),
            ("indicators", indicators.as_str()),
            ("contract_text", contract_text),
            ("question", question),
        ]);
        let prompt = self.template.format(&vars)?;

        let response = self
            .invoker
            .invoke(&self.config, category, Some(&prompt.system), &prompt.user)
            .await?;

        Ok(self.parser.parse_or_fallback(&response, category))
    }

    fn config(&self) -> &AgentConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{InMemoryUsageTracker, MockAIProvider};
    use crate::domain::extraction::FALLBACK_CONFIDENCE;
    use crate::ports::AIError;

    const CONTRACT: &str = "The aggregate liability of either party shall not exceed the fees paid.";

    fn specialist(provider: MockAIProvider) -> (LlmSpecialist, Arc<MockAIProvider>) {
        let provider = Arc::new(provider);
        let library = PromptLibrary::with_defaults().unwrap();
        let specialist =
            LlmSpecialist::from_library(SpecialistId::RiskLiability, provider.clone(), &library).unwrap();
        (specialist, provider)
    }

    #[test]
    fn constructors_set_identity_and_categories() {
        let provider: Arc<dyn AIProvider> = Arc::new(MockAIProvider::new());
        let template = PromptTemplate::new("t", "", "");

        let ip = LlmSpecialist::ip_commercial(provider.clone(), template.clone());
        let temporal = LlmSpecialist::temporal_renewal(provider, template);

        assert_eq!(ip.config().name(), "ip_commercial");
        assert_eq!(ip.config().categories().len(), 17);
        assert!(ip.config().handles_category("License Grant"));
        assert!(!ip.config().handles_category("Governing Law"));
        assert_eq!(temporal.id(), SpecialistId::TemporalRenewal);
        assert_eq!(temporal.config().prompt_name.as_deref(), Some("t"));
    }

    #[tokio::test]
    async fn parses_json_response() {
        let (specialist, provider) = specialist(MockAIProvider::new().with_response(
            r#"```json
{"extracted_clauses": ["The aggregate liability of either party shall not exceed the fees paid."],
 "reasoning": "explicit cap", "confidence": 0.92, "category_indicators_found": ["shall not exceed"]}
```"#,
        ));

        let result = specialist
            .extract(CONTRACT, "Cap on Liability", "Is liability capped?")
            .await
            .unwrap();

        assert_eq!(result.clause_count(), 1);
        assert_eq!(result.confidence, 0.92);
        assert_eq!(result.category, "Cap on Liability");

        let call = &provider.get_calls()[0];
        assert!(call.system_prompt.as_deref().unwrap_or_default().contains("risk allocation"));
        let user = &call.messages[0].content;
        assert!(user.contains("- aggregate liability"));
        assert!(user.contains(CONTRACT));
        assert!(user.contains("QUESTION: Is liability capped?"));
    }

    #[tokio::test]
    async fn unparseable_response_falls_back_to_raw_text() {
        let (specialist, _) = specialist(MockAIProvider::new().with_response("shall not exceed the fees paid"));

        let result = specialist.extract(CONTRACT, "Cap on Liability", "q").await.unwrap();

        assert_eq!(result.extracted_clauses, vec!["shall not exceed the fees paid"]);
        assert_eq!(result.confidence, FALLBACK_CONFIDENCE);
    }

    #[tokio::test]
    async fn sentinel_fallback_is_empty() {
        let (specialist, _) = specialist(MockAIProvider::new().with_response("No related clause."));

        let result = specialist.extract(CONTRACT, "Insurance", "q").await.unwrap();

        assert!(result.is_empty());
        assert_eq!(result.confidence, FALLBACK_CONFIDENCE);
    }

    #[tokio::test]
    async fn provider_errors_propagate() {
        let (specialist, _) =
            specialist(MockAIProvider::new().with_error(AIError::Timeout { timeout_secs: 120 }));

        let err = specialist.extract(CONTRACT, "Insurance", "q").await.unwrap_err();

        assert!(matches!(err, AgentError::Provider(AIError::Timeout { .. })));
    }

    #[tokio::test]
    async fn missing_template_variable_is_prompt_error() {
        let provider: Arc<dyn AIProvider> = Arc::new(MockAIProvider::new());
        let template = PromptTemplate::new("t", "", "{contract_text}").with_variables(["party_names"]);
        let specialist = LlmSpecialist::risk_liability(provider, template);

        let err = specialist.extract(CONTRACT, "Insurance", "q").await.unwrap_err();

        assert!(matches!(err, AgentError::Prompt(PromptError::MissingVariable(_))));
    }

    #[tokio::test]
    async fn usage_is_recorded_per_call() {
        let tracker = Arc::new(InMemoryUsageTracker::new());
        let (specialist, _) = specialist(MockAIProvider::new());
        let specialist = specialist
            .with_model_settings("claude-3-haiku-20240307", 0.0, 1024)
            .with_usage_tracker(tracker.clone());

        specialist.extract(CONTRACT, "Insurance", "q").await.unwrap();

        let records = tracker.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].agent_name, "risk_liability");
        assert_eq!(records[0].category, "Insurance");
        assert_eq!(specialist.config().max_tokens, 1024);
    }
}
