//! Model Endpoint adapters (§6, §9) - three implementations of the narrow
//! `ModelEndpoint` port: production, scripted mock, deterministic mock.

mod deterministic_mock;
mod http_endpoint;
mod scripted_mock;

pub use deterministic_mock::DeterministicMockModelEndpoint;
pub use http_endpoint::{HttpModelEndpoint, HttpModelEndpointConfig};
pub use scripted_mock::{ScriptedMockModelEndpoint, ScriptedOutcome};
