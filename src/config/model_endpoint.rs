//! Model endpoint configuration (§6, §10.2).

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

/// Which `ModelEndpoint` implementation to construct at startup.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModelEndpointProvider {
    /// `HttpModelEndpoint` — the real, network-backed endpoint.
    #[default]
    Http,
    /// `ScriptedMockModelEndpoint` — keyed responses and scripted failures, dev/test only.
    ScriptedMock,
    /// `DeterministicMockModelEndpoint` — content is a pure function of the request, test only.
    DeterministicMock,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelEndpointConfig {
    #[serde(default)]
    pub provider: ModelEndpointProvider,

    /// Base URL for `ModelEndpointProvider::Http`.
    pub base_url: Option<String>,

    /// API key for `ModelEndpointProvider::Http`.
    pub api_key: Option<SecretString>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ModelEndpointConfig {
    fn default() -> Self {
        Self { provider: ModelEndpointProvider::default(), base_url: None, api_key: None, timeout_secs: default_timeout_secs() }
    }
}

fn default_timeout_secs() -> u64 {
    60
}

impl ModelEndpointConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// A real model endpoint is required in production; mocks would silently
    /// fabricate generated content.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if *environment == Environment::Production && self.provider != ModelEndpointProvider::Http {
            return Err(ValidationError::MockModelEndpointInProduction);
        }
        if self.provider == ModelEndpointProvider::Http {
            if self.base_url.as_deref().unwrap_or_default().trim().is_empty() {
                return Err(ValidationError::MissingRequired("model_endpoint.base_url"));
            }
            if self.api_key.is_none() {
                return Err(ValidationError::MissingRequired("model_endpoint.api_key"));
            }
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_provider_requires_base_url_and_key() {
        let config = ModelEndpointConfig { provider: ModelEndpointProvider::Http, ..Default::default() };
        assert!(config.validate(&Environment::Development).is_err());
    }

    #[test]
    fn mock_providers_are_rejected_in_production() {
        let config = ModelEndpointConfig { provider: ModelEndpointProvider::DeterministicMock, ..Default::default() };
        assert!(config.validate(&Environment::Production).is_err());
        assert!(config.validate(&Environment::Development).is_ok());
    }
}
