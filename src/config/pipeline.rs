//! Pipeline configuration (§9, §10.2) — C2 validator thresholds and C3
//! retry policy, as plain fields passed by reference into component
//! constructors rather than read as globals.

use serde::Deserialize;

use crate::domain::generation::{RetryPolicy, ValidatorConstraints};

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_min_length")]
    pub min_length: usize,

    #[serde(default = "default_max_length")]
    pub max_length: usize,

    #[serde(default = "default_min_meaningful_length")]
    pub min_meaningful_length: usize,

    #[serde(default = "default_max_repetition_ratio")]
    pub max_repetition_ratio: f64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_backoff_cap_secs")]
    pub backoff_cap_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
            max_length: default_max_length(),
            min_meaningful_length: default_min_meaningful_length(),
            max_repetition_ratio: default_max_repetition_ratio(),
            max_retries: default_max_retries(),
            backoff_cap_secs: default_backoff_cap_secs(),
        }
    }
}

fn default_min_length() -> usize {
    20
}

fn default_max_length() -> usize {
    4000
}

fn default_min_meaningful_length() -> usize {
    5
}

fn default_max_repetition_ratio() -> f64 {
    0.4
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_cap_secs() -> u64 {
    16
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.min_length >= self.max_length {
            return Err(ValidationError::InvalidValidatorBounds);
        }
        if !(0.0..=1.0).contains(&self.max_repetition_ratio) {
            return Err(ValidationError::InvalidValidatorBounds);
        }
        if self.max_retries == 0 {
            return Err(ValidationError::InvalidRetryPolicy);
        }
        Ok(())
    }

    pub fn validator_constraints(&self) -> ValidatorConstraints {
        ValidatorConstraints {
            min_length: self.min_length,
            max_length: self.max_length,
            min_meaningful: self.min_meaningful_length,
            max_repetition_ratio: self.max_repetition_ratio,
            custom_structural_patterns: Vec::new(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_validator_defaults() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        let constraints = config.validator_constraints();
        assert_eq!(constraints, ValidatorConstraints::default());
    }

    #[test]
    fn rejects_min_length_above_max_length() {
        let config = PipelineConfig { min_length: 100, max_length: 50, ..Default::default() };
        assert!(config.validate().is_err());
    }
}
