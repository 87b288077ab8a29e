//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `CONTRACT_AGENTS` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use contract_agents::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Batch concurrency: {}", config.batch.max_concurrency);
//! ```

mod agents;
mod ai;
mod batch;
mod error;

pub use agents::AgentsConfig;
pub use ai::{AiConfig, AiProvider};
pub use batch::BatchConfig;
pub use error::{ConfigError, ValidationError};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment loads; `validate`
/// then reports what is missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// AI provider configuration (Anthropic/OpenAI)
    #[serde(default)]
    pub ai: AiConfig,

    /// Specialist model settings and validation switches
    #[serde(default)]
    pub agents: AgentsConfig,

    /// Batch execution limits
    #[serde(default)]
    pub batch: BatchConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `CONTRACT_AGENTS` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `CONTRACT_AGENTS__AI__ANTHROPIC_API_KEY=...` -> `ai.anthropic_api_key = ...`
    /// - `CONTRACT_AGENTS__BATCH__MAX_CONCURRENCY=8` -> `batch.max_concurrency = 8`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CONTRACT_AGENTS")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ai.validate()?;
        self.agents.validate()?;
        self.batch.validate()?;
        Ok(())
    }
}
