//! Batch runner configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    /// Samples in flight at once
    #[serde(default = "default_concurrency")]
    pub max_concurrency: usize,

    /// Per-sample deadline in seconds; unbounded when unset
    pub request_timeout_secs: Option<u64>,
}

impl BatchConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_concurrency == 0 {
            return Err(ValidationError::InvalidConcurrency);
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_concurrency(),
            request_timeout_secs: None,
        }
    }
}

fn default_concurrency() -> usize {
    4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = BatchConfig::default();
        assert_eq!(config.max_concurrency, 4);
        assert_eq!(config.request_timeout(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_concurrency_and_timeout() {
        let config = BatchConfig {
            max_concurrency: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidConcurrency));

        let config = BatchConfig {
            request_timeout_secs: Some(0),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidTimeout));
    }

    #[test]
    fn timeout_duration() {
        let config = BatchConfig {
            request_timeout_secs: Some(30),
            ..Default::default()
        };
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
    }
}
