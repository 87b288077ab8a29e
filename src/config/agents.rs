//! Agent model settings and validation switches

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Settings shared by every specialist
#[derive(Debug, Clone, Deserialize)]
pub struct AgentsConfig {
    #[serde(default)]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Attach the grounding validator
    #[serde(default = "default_true")]
    pub validation_enabled: bool,

    /// Let the validator ask the model again about empty results
    #[serde(default)]
    pub llm_recheck: bool,

    /// Extra prompt templates; files here override the built-in ones by name
    pub prompts_dir: Option<PathBuf>,
}

impl AgentsConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::InvalidTemperature(self.temperature));
        }
        if self.max_tokens == 0 {
            return Err(ValidationError::InvalidMaxTokens);
        }
        Ok(())
    }
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            validation_enabled: true,
            llm_recheck: false,
            prompts_dir: None,
        }
    }
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AgentsConfig::default();
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.max_tokens, 4096);
        assert!(config.validation_enabled);
        assert!(!config.llm_recheck);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn temperature_out_of_range() {
        let config = AgentsConfig {
            temperature: 2.5,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidTemperature(2.5)));

        let config = AgentsConfig {
            temperature: f32::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_max_tokens() {
        let config = AgentsConfig {
            max_tokens: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidMaxTokens));
    }
}
