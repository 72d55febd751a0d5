//! Production `ModelEndpoint` - invokes an HTTP-backed model service.
//!
//! Grounded on the teacher's `AnthropicProvider`/`OpenAIProvider` shape
//! (a `reqwest::Client` plus a `secrecy`-guarded API key), narrowed to the
//! single request/response contract §6 names instead of the teacher's
//! chat-completion surface.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{InvocationRequest, InvocationResponse, ModelEndpoint};

#[derive(Debug, Clone)]
pub struct HttpModelEndpointConfig {
    pub base_url: String,
    pub api_key: SecretString,
    pub timeout: Duration,
}

/// Model endpoint backed by a real HTTP service.
///
/// A timeout is reported as a retryable `generation_failure` per §5's
/// cancellation/timeout note; the endpoint itself never classifies
/// failures further, leaving that to C3.
pub struct HttpModelEndpoint {
    client: reqwest::Client,
    config: HttpModelEndpointConfig,
}

impl HttpModelEndpoint {
    pub fn new(config: HttpModelEndpointConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("reqwest client builds with a finite timeout");
        Self { client, config }
    }
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    generation_input_id: &'a str,
    section_id: i32,
    prompt_text: &'a str,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    raw_output: String,
    is_successful: bool,
    error_message: Option<String>,
}

#[async_trait]
impl ModelEndpoint for HttpModelEndpoint {
    async fn invoke(&self, request: InvocationRequest) -> InvocationResponse {
        let wire = WireRequest {
            generation_input_id: &request.generation_input_id,
            section_id: request.section_id.value(),
            prompt_text: &request.prompt_text,
            max_tokens: request.constraints.max_tokens,
            temperature: request.constraints.temperature,
        };

        let result = self
            .client
            .post(format!("{}/v1/invoke", self.config.base_url))
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&wire)
            .send()
            .await;

        match result {
            Ok(resp) => match resp.json::<WireResponse>().await {
                Ok(body) if body.is_successful => InvocationResponse::success(body.raw_output),
                Ok(body) => InvocationResponse::failure(
                    body.error_message.unwrap_or_else(|| "model reported failure".to_string()),
                ),
                Err(err) => InvocationResponse::failure(format!("malformed model response: {err}")),
            },
            Err(err) if err.is_timeout() => InvocationResponse::failure("model invocation timed out"),
            Err(err) => InvocationResponse::failure(format!("model request failed: {err}")),
        }
    }

    fn estimate_tokens(&self, text: &str) -> u32 {
        (text.len() / 4).max(1) as u32
    }
}
