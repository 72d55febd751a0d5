//! Model Endpoint Port - interface for the section-generation model.
//!
//! Abstracts the external model used by the Section Generator (C3). The
//! pipeline treats the model as a pure request/response contract: no
//! streaming, no session state, no retries at this layer (C3 owns retries).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::foundation::SectionId;

/// Port for invoking the section-generation model.
///
/// At least three implementations are expected: a production HTTP-backed
/// endpoint, a scripted mock (keyed responses, scripted failures), and a
/// deterministic mock whose content is a pure function of the request
/// fields (used by the end-to-end tests in `tests/`).
#[async_trait]
pub trait ModelEndpoint: Send + Sync {
    /// Invoke the model for a single section.
    async fn invoke(&self, request: InvocationRequest) -> InvocationResponse;

    /// Estimate token count for text (used for prompt-budget checks before invoking).
    fn estimate_tokens(&self, text: &str) -> u32;
}

/// Request to generate content for one section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub generation_input_id: String,
    pub section_id: SectionId,
    pub prompt_text: String,
    pub constraints: InvocationConstraints,
}

impl InvocationRequest {
    pub fn new(
        generation_input_id: impl Into<String>,
        section_id: SectionId,
        prompt_text: impl Into<String>,
        constraints: InvocationConstraints,
    ) -> Self {
        Self {
            generation_input_id: generation_input_id.into(),
            section_id,
            prompt_text: prompt_text.into(),
            constraints,
        }
    }
}

/// Per-section generation constraints passed through to the model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvocationConstraints {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Response from a model invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationResponse {
    pub raw_output: String,
    pub is_successful: bool,
    pub error_message: Option<String>,
    pub invocation_metadata: HashMap<String, String>,
}

impl InvocationResponse {
    pub fn success(raw_output: impl Into<String>) -> Self {
        Self {
            raw_output: raw_output.into(),
            is_successful: true,
            error_message: None,
            invocation_metadata: HashMap::new(),
        }
    }

    pub fn failure(error_message: impl Into<String>) -> Self {
        Self {
            raw_output: String::new(),
            is_successful: false,
            error_message: Some(error_message.into()),
            invocation_metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.invocation_metadata.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_response_has_no_error() {
        let resp = InvocationResponse::success("hello world");
        assert!(resp.is_successful);
        assert!(resp.error_message.is_none());
    }

    #[test]
    fn failure_response_carries_message() {
        let resp = InvocationResponse::failure("timeout");
        assert!(!resp.is_successful);
        assert_eq!(resp.error_message.as_deref(), Some("timeout"));
    }

    #[test]
    fn model_endpoint_is_object_safe() {
        fn check<T: ModelEndpoint + ?Sized>() {}
        check::<dyn ModelEndpoint>();
    }
}
