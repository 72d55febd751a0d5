//! Request/response DTOs for the pipeline HTTP edge (§6).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::audit::AuditLogEntry;
use crate::domain::regeneration::RegenerationStrategy;

fn default_strategy() -> RegenerationStrategy {
    RegenerationStrategy::ReuseUnchanged
}

#[derive(Debug, Deserialize)]
pub struct RegenerateSectionsRequest {
    pub document_id: String,
    pub target_sections: Vec<i32>,
    #[serde(default = "default_strategy")]
    pub strategy: RegenerationStrategy,
    #[serde(default)]
    pub client_data: Value,
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub section_overrides: HashMap<String, Value>,
    #[serde(default)]
    pub correlation_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegenerateFullRequest {
    pub document_id: String,
    #[serde(default = "default_strategy")]
    pub strategy: RegenerationStrategy,
    #[serde(default)]
    pub client_data: Value,
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub section_overrides: HashMap<String, Value>,
    #[serde(default)]
    pub correlation_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegenerateTemplateUpdateRequest {
    pub document_id: String,
    pub new_template_version_id: String,
    #[serde(default = "default_strategy")]
    pub strategy: RegenerationStrategy,
    #[serde(default)]
    pub client_data: Value,
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub section_overrides: HashMap<String, Value>,
    #[serde(default)]
    pub correlation_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegenerationResponse {
    pub document_version_id: String,
    pub version_number: i32,
    pub rendered_document_id: String,
    pub regenerated_sections: Vec<i32>,
    pub reused_sections: Vec<i32>,
}

#[derive(Debug, Deserialize)]
pub struct RegenerationHistoryQuery {
    pub document_id: String,
}

#[derive(Debug, Serialize)]
pub struct RegenerationHistoryResponse {
    pub entries: Vec<AuditLogEntry>,
}

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub document_id: String,
    pub version_intent: i32,
    #[serde(default)]
    pub force_rerender: bool,
    #[serde(default)]
    pub correlation_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub rendered_document_id: String,
    pub version: i32,
    pub output_blob_key: String,
    pub content_hash: String,
}

#[derive(Debug, Serialize)]
pub struct DemoValidateResponse {
    pub valid: bool,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub details: Option<Value>,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { code: "BAD_REQUEST".to_string(), message: message.into(), details: None }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self { code: "NOT_FOUND".to_string(), message: message.into(), details: None }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self { code: "INTERNAL".to_string(), message: message.into(), details: None }
    }
}
