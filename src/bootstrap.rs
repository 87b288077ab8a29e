//! Composition root: builds providers, agents and the orchestrator from
//! `AppConfig`.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::adapters::agents::{GroundingValidator, LlmSpecialist, PromptLibrary};
use crate::adapters::ai::{AnthropicConfig, AnthropicProvider, OpenAIConfig, OpenAIProvider};
use crate::application::{BatchRunner, Orchestrator, OrchestratorBuildError};
use crate::config::{AiConfig, AiProvider, AppConfig, ValidationError};
use crate::domain::extraction::{CategoryRouter, PromptError, SpecialistId};
use crate::ports::{AIError, AIProvider, SpecialistAgent, UsageTracker};

/// Failure while wiring the pipeline.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("Provider setup failed: {0}")]
    Provider(#[from] AIError),

    #[error("Prompt setup failed: {0}")]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorBuildError),
}

/// Builds the configured primary provider.
pub fn build_provider(config: &AiConfig) -> Result<Arc<dyn AIProvider>, BootstrapError> {
    let key = config.primary_api_key().ok_or(match config.primary_provider {
        AiProvider::OpenAI => ValidationError::MissingRequired("OPENAI_API_KEY"),
        AiProvider::Anthropic => ValidationError::MissingRequired("ANTHROPIC_API_KEY"),
    })?;

    let provider: Arc<dyn AIProvider> = match config.primary_provider {
        AiProvider::Anthropic => {
            let mut provider_config = AnthropicConfig::new(key)
                .with_timeout(config.timeout())
                .with_max_retries(config.max_retries);
            if let Some(model) = &config.model {
                provider_config = provider_config.with_model(model);
            }
            Arc::new(AnthropicProvider::new(provider_config)?)
        }
        AiProvider::OpenAI => {
            let mut provider_config = OpenAIConfig::new(key)
                .with_timeout(config.timeout())
                .with_max_retries(config.max_retries);
            if let Some(model) = &config.model {
                provider_config = provider_config.with_model(model);
            }
            Arc::new(OpenAIProvider::new(provider_config)?)
        }
    };

    Ok(provider)
}

/// Built-in prompts, overridden by any templates in `agents.prompts_dir`.
pub fn load_prompts(config: &AppConfig) -> Result<PromptLibrary, BootstrapError> {
    let mut library = PromptLibrary::with_defaults()?;
    if let Some(dir) = &config.agents.prompts_dir {
        let loaded = library.load_dir(dir)?;
        tracing::info!(dir = %dir.display(), loaded, "loaded prompt overrides");
    }
    Ok(library)
}

/// Builds the standard three-specialist orchestrator.
///
/// The grounding validator is attached when `agents.validation_enabled`,
/// with model re-checks when `agents.llm_recheck`.
pub fn build_orchestrator(
    config: &AppConfig,
    provider: Arc<dyn AIProvider>,
    library: &PromptLibrary,
    usage: Option<Arc<dyn UsageTracker>>,
) -> Result<Orchestrator, BootstrapError> {
    let model = config
        .ai
        .model
        .clone()
        .unwrap_or_else(|| provider.provider_info().model);

    let mut specialists: HashMap<SpecialistId, Arc<dyn SpecialistAgent>> = HashMap::new();
    for id in SpecialistId::all() {
        let mut specialist = LlmSpecialist::from_library(*id, Arc::clone(&provider), library)?
            .with_model_settings(model.clone(), config.agents.temperature, config.agents.max_tokens);
        if let Some(tracker) = &usage {
            specialist = specialist.with_usage_tracker(Arc::clone(tracker));
        }
        specialists.insert(*id, Arc::new(specialist));
    }

    let mut orchestrator = Orchestrator::strict(Arc::new(CategoryRouter::standard()), specialists)?;

    if config.agents.validation_enabled {
        let mut validator = GroundingValidator::new();
        if config.agents.llm_recheck {
            validator = validator.with_recheck(Arc::clone(&provider));
            if let Some(tracker) = &usage {
                validator = validator.with_usage_tracker(Arc::clone(tracker));
            }
        }
        orchestrator = orchestrator.with_validator(Arc::new(validator));
    }

    tracing::info!(
        model = %model,
        validation = config.agents.validation_enabled,
        recheck = config.agents.llm_recheck,
        "orchestrator ready"
    );
    Ok(orchestrator)
}

/// Batch runner sized from `batch` settings.
pub fn build_batch_runner(config: &AppConfig, orchestrator: Arc<Orchestrator>) -> BatchRunner {
    let runner = BatchRunner::new(orchestrator, config.batch.max_concurrency);
    match config.batch.request_timeout() {
        Some(timeout) => runner.with_request_timeout(timeout),
        None => runner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{InMemoryUsageTracker, MockAIProvider};
    use crate::config::{AgentsConfig, BatchConfig};

    fn app_config(validation_enabled: bool, llm_recheck: bool) -> AppConfig {
        AppConfig {
            ai: AiConfig {
                anthropic_api_key: Some("sk-ant-xxx".to_string()),
                ..Default::default()
            },
            agents: AgentsConfig {
                validation_enabled,
                llm_recheck,
                max_tokens: 2048,
                ..Default::default()
            },
            batch: BatchConfig {
                max_concurrency: 3,
                request_timeout_secs: Some(10),
            },
        }
    }

    #[test]
    fn provider_requires_primary_key() {
        let err = build_provider(&AiConfig::default()).err();
        assert!(matches!(
            err,
            Some(BootstrapError::Config(ValidationError::MissingRequired("ANTHROPIC_API_KEY")))
        ));
    }

    #[test]
    fn provider_uses_configured_model() {
        let config = AiConfig {
            primary_provider: AiProvider::OpenAI,
            openai_api_key: Some("sk-xxx".to_string()),
            model: Some("gpt-4o-mini".to_string()),
            ..Default::default()
        };

        let provider = build_provider(&config).unwrap();

        assert_eq!(provider.provider_info().model, "gpt-4o-mini");
    }

    #[tokio::test]
    async fn orchestrator_wires_specialists_and_validator() {
        let config = app_config(true, false);
        let provider: Arc<dyn AIProvider> = Arc::new(MockAIProvider::new().with_response(
            r#"{"extracted_clauses": ["governed by Delaware law"], "confidence": 0.9}"#,
        ));
        let tracker = Arc::new(InMemoryUsageTracker::new());
        let library = load_prompts(&config).unwrap();

        let orchestrator =
            build_orchestrator(&config, provider, &library, Some(tracker.clone())).unwrap();
        let result = orchestrator
            .extract("This Agreement is governed by Delaware law.", "Governing Law", "q")
            .await;

        assert!(orchestrator.has_validator());
        assert_eq!(result.extracted_clauses, vec!["governed by Delaware law"]);
        assert_eq!(result.grounding_rate, Some(1.0));
        assert_eq!(tracker.records()[0].agent_name, "temporal_renewal");
        let specialist = orchestrator.specialist(SpecialistId::RiskLiability).unwrap();
        assert_eq!(specialist.config().max_tokens, 2048);
    }

    #[test]
    fn validation_can_be_disabled() {
        let config = app_config(false, false);
        let provider: Arc<dyn AIProvider> = Arc::new(MockAIProvider::new());
        let library = PromptLibrary::with_defaults().unwrap();

        let orchestrator = build_orchestrator(&config, provider, &library, None).unwrap();

        assert!(!orchestrator.has_validator());
    }

    #[test]
    fn batch_runner_follows_config() {
        let config = app_config(true, false);
        let provider: Arc<dyn AIProvider> = Arc::new(MockAIProvider::new());
        let library = PromptLibrary::with_defaults().unwrap();
        let orchestrator = build_orchestrator(&config, provider, &library, None).unwrap();

        let runner = build_batch_runner(&config, Arc::new(orchestrator));

        assert_eq!(runner.max_concurrency(), 3);
    }
}
