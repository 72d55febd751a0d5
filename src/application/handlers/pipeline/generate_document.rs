//! `JobHandler` for `JobType::Generate` — first-version document generation.
//! Thin: decodes the job payload, builds a `RunRequest` for version intent 1,
//! and delegates everything to the `PipelineCoordinator`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::foundation::{DomainError, ErrorCode, SectionId};
use crate::domain::job::JobType;
use crate::ports::JobHandler;

use super::coordinator::{PipelineCoordinator, RunRequest};

#[derive(Debug, Deserialize)]
struct GeneratePayload {
    document_id: String,
    client_data: Value,
    #[serde(default)]
    section_overrides: HashMap<String, Value>,
    #[serde(default)]
    correlation_id: Option<String>,
}

pub struct GenerateDocumentHandler {
    coordinator: Arc<PipelineCoordinator>,
}

impl GenerateDocumentHandler {
    pub fn new(coordinator: Arc<PipelineCoordinator>) -> Self {
        Self { coordinator }
    }
}

#[async_trait]
impl JobHandler for GenerateDocumentHandler {
    async fn handle(&self, job_type: JobType, payload: Value) -> Result<Value, DomainError> {
        if job_type != JobType::Generate {
            return Err(DomainError::new(ErrorCode::ValidationFailed, format!("GenerateDocumentHandler cannot handle job type {job_type:?}")));
        }

        let payload: GeneratePayload =
            serde_json::from_value(payload).map_err(|e| DomainError::new(ErrorCode::ValidationFailed, format!("invalid generate payload: {e}")))?;

        let document_id = payload
            .document_id
            .parse()
            .map_err(|_| DomainError::new(ErrorCode::ValidationFailed, "document_id is not a valid id"))?;

        let section_overrides = payload
            .section_overrides
            .into_iter()
            .filter_map(|(k, v)| k.parse::<i32>().ok().map(|n| (SectionId::new(n), v)))
            .collect();

        let request = RunRequest {
            document_id,
            version_intent: 1,
            client_data: payload.client_data,
            section_overrides,
            reused_outputs: Vec::new(),
            force_rerender: false,
            correlation_id: payload.correlation_id,
        };

        let outcome = self.coordinator.run(request).await?;
        Ok(serde_json::json!({
            "document_version_id": outcome.document_version.id,
            "version_number": outcome.document_version.version_number,
            "rendered_document_id": outcome.rendered_document.id,
        }))
    }
}
