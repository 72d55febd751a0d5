//! `JobHandler` for `JobType::Regenerate` — runs the Regeneration Planner
//! (C7) against the document's current version, then drives the same
//! `PipelineCoordinator` with the reused outputs the plan selects.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::foundation::{DomainError, ErrorCode, Repository, SectionId};
use crate::domain::job::JobType;
use crate::domain::regeneration::{plan_regeneration, RegenerationRequest, RegenerationScope, RegenerationStrategy};
use crate::ports::{
    DocumentRepository, DocumentVersionRepository, GenerationInputBatchRepository, JobHandler,
    SectionOutputBatchRepository, SectionRepository, TemplateVersionRepository,
};

use super::coordinator::{PipelineCoordinator, ReusedOutput, RunRequest};

#[derive(Debug, Deserialize)]
struct RegeneratePayload {
    document_id: String,
    client_data: Value,
    scope: RegenerationScope,
    #[serde(default = "default_strategy")]
    strategy: RegenerationStrategy,
    #[serde(default)]
    force: bool,
    #[serde(default)]
    section_overrides: HashMap<String, Value>,
    #[serde(default)]
    correlation_id: Option<String>,
}

fn default_strategy() -> RegenerationStrategy {
    RegenerationStrategy::ReuseUnchanged
}

pub struct RegenerateDocumentHandler {
    coordinator: Arc<PipelineCoordinator>,
    documents: Arc<dyn DocumentRepository>,
    document_versions: Arc<dyn DocumentVersionRepository>,
    template_versions: Arc<dyn TemplateVersionRepository>,
    sections: Arc<dyn SectionRepository>,
    input_batches: Arc<dyn GenerationInputBatchRepository>,
    output_batches: Arc<dyn SectionOutputBatchRepository>,
}

impl RegenerateDocumentHandler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        coordinator: Arc<PipelineCoordinator>,
        documents: Arc<dyn DocumentRepository>,
        document_versions: Arc<dyn DocumentVersionRepository>,
        template_versions: Arc<dyn TemplateVersionRepository>,
        sections: Arc<dyn SectionRepository>,
        input_batches: Arc<dyn GenerationInputBatchRepository>,
        output_batches: Arc<dyn SectionOutputBatchRepository>,
    ) -> Self {
        Self { coordinator, documents, document_versions, template_versions, sections, input_batches, output_batches }
    }
}

#[async_trait]
impl JobHandler for RegenerateDocumentHandler {
    async fn handle(&self, job_type: JobType, payload: Value) -> Result<Value, DomainError> {
        if job_type != JobType::Regenerate {
            return Err(DomainError::new(ErrorCode::ValidationFailed, format!("RegenerateDocumentHandler cannot handle job type {job_type:?}")));
        }

        let payload: RegeneratePayload =
            serde_json::from_value(payload).map_err(|e| DomainError::new(ErrorCode::ValidationFailed, format!("invalid regenerate payload: {e}")))?;

        let document_id = payload
            .document_id
            .parse()
            .map_err(|_| DomainError::new(ErrorCode::ValidationFailed, "document_id is not a valid id"))?;

        let document = self.documents.find_by_id(document_id).await?.ok_or_else(|| {
            DomainError::new(ErrorCode::NotFound, format!("document {document_id} not found"))
        })?;

        let current_template_version = self.template_versions.find_by_id(document.template_version_id).await?.ok_or_else(|| {
            DomainError::new(ErrorCode::NotFound, format!("template version {} not found", document.template_version_id))
        })?;
        let current_sections = self.sections.find_by_template_version(current_template_version.id).await?;
        let static_section_ids: Vec<SectionId> = current_sections.iter().filter(|s| s.is_static()).map(|s| s.id).collect();

        let effective_template_version_id = match &payload.scope {
            RegenerationScope::TemplateUpdate { new_template_version_id } => *new_template_version_id,
            _ => current_template_version.id,
        };
        let dynamic_section_ids: Vec<SectionId> = if effective_template_version_id == current_template_version.id {
            current_sections.iter().filter(|s| s.is_dynamic()).map(|s| s.id).collect()
        } else {
            self.sections
                .find_by_template_version(effective_template_version_id)
                .await?
                .into_iter()
                .filter(|s| s.is_dynamic())
                .map(|s| s.id)
                .collect()
        };

        let previous_version = document.current_version;
        let previous_input_batch = self.input_batches.batch_by(document_id, previous_version).await?;
        let previous_input_hashes: HashMap<SectionId, String> = previous_input_batch
            .as_ref()
            .map(|batch| batch.inputs.iter().map(|i| (i.section_id, i.input_hash.clone())).collect())
            .unwrap_or_default();

        let section_overrides: HashMap<SectionId, Value> = payload
            .section_overrides
            .iter()
            .filter_map(|(k, v)| k.parse::<i32>().ok().map(|n| (SectionId::new(n), v.clone())))
            .collect();
        let current_input_hashes: HashMap<SectionId, String> = dynamic_section_ids
            .iter()
            .map(|&section_id| {
                let override_value = section_overrides.get(&section_id);
                let hash = crate::domain::generation::input_hash(&section_id.to_string(), &payload.client_data, override_value)
                    .unwrap_or_default();
                (section_id, hash)
            })
            .collect();

        let request = RegenerationRequest::new(document_id, payload.scope.clone(), payload.strategy, payload.force);
        let plan = plan_regeneration(
            &request,
            &dynamic_section_ids,
            &static_section_ids,
            &previous_input_hashes,
            &current_input_hashes,
            previous_version,
        )?;

        let mut reused_outputs = Vec::new();
        if !plan.reuse.is_empty() {
            let previous_output_batch = previous_input_batch
                .as_ref()
                .map(|batch| self.output_batches.find_by_input_batch(batch.id))
                .transpose()?
                .flatten();

            if let Some(previous_output_batch) = previous_output_batch {
                for &section_id in &plan.reuse {
                    if let Some(output) = previous_output_batch.output_for_section(section_id) {
                        if let (Some(content), Some(hash)) = (&output.generated_content, &output.content_hash) {
                            reused_outputs.push(ReusedOutput {
                                section_id,
                                generated_content: content.clone(),
                                content_hash: hash.clone(),
                                validation_result: output.validation_result.clone().unwrap_or_default(),
                            });
                        }
                    }
                }
            }
        }

        let run_request = RunRequest {
            document_id,
            version_intent: plan.new_version_intent,
            client_data: payload.client_data,
            section_overrides,
            reused_outputs,
            force_rerender: payload.force,
            correlation_id: payload.correlation_id,
        };

        let outcome = self.coordinator.run(run_request).await?;
        Ok(serde_json::json!({
            "document_version_id": outcome.document_version.id,
            "version_number": outcome.document_version.version_number,
            "rendered_document_id": outcome.rendered_document.id,
            "regenerated_sections": plan.regenerate,
            "reused_sections": plan.reuse,
        }))
    }
}
