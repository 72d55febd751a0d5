//! Pipeline Coordinator (C9, §4.9) — drives one `(document_id,
//! version_intent)` through input preparation, section generation,
//! assembly, rendering, and versioning. Every stage checks for an existing
//! immutable artifact before redoing the work, so re-running the same
//! `(document_id, version_intent)` is always safe.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::domain::assembly::{AssembledDocument, AssemblyStatus, BlockCounts};
use crate::domain::audit::{AuditLogEntry, EntityType};
use crate::domain::document::{Document, DocumentVersion, GenerationMetadata};
use crate::domain::foundation::{
    sha256_hex, sha256_hex_canonical_json, sha256_hex_str, DocumentId, DomainError, ErrorCode,
    Repository, SectionId,
};
use crate::domain::generation::{
    assemble_prompt, input_hash, validate, FailureType, GenerationInput, GenerationInputBatch,
    PromptInputs, RetryAttempt, RetryPolicy, SectionOutput, SectionOutputBatch, ValidationResult,
    ValidatorConstraints,
};
use crate::domain::rendering::{RenderedBlockCounts, RenderedDocument};
use crate::domain::template::{Block, BlockType, ParsedDocument, Section, SectionType, TemplateVersion};
use crate::ports::{
    keys, AssembledDocumentRepository, AuditLogRepository, DocumentRepository,
    DocumentVersionRepository, GenerationInputBatchRepository, InvocationConstraints,
    InvocationRequest, ModelEndpoint, ObjectStore, RenderedDocumentRepository,
    SectionOutputBatchRepository, SectionRepository, TemplateVersionRepository, WordCodecRenderer,
};

/// Shared dependencies for driving the pipeline. Constructed once at startup
/// and handed to both the generate and regenerate job handlers.
pub struct PipelineCoordinator {
    pub template_versions: Arc<dyn TemplateVersionRepository>,
    pub sections: Arc<dyn SectionRepository>,
    pub documents: Arc<dyn DocumentRepository>,
    pub document_versions: Arc<dyn DocumentVersionRepository>,
    pub input_batches: Arc<dyn GenerationInputBatchRepository>,
    pub output_batches: Arc<dyn SectionOutputBatchRepository>,
    pub assembled_documents: Arc<dyn AssembledDocumentRepository>,
    pub rendered_documents: Arc<dyn RenderedDocumentRepository>,
    pub audit_log: Arc<dyn AuditLogRepository>,
    pub object_store: Arc<dyn ObjectStore>,
    pub model_endpoint: Arc<dyn ModelEndpoint>,
    pub renderer: Arc<dyn WordCodecRenderer>,
    pub validator_constraints: ValidatorConstraints,
    pub retry_policy: RetryPolicy,
}

/// A prior section output spliced into a new batch without re-invoking the
/// model, supplied by the regenerate handler for the planner's `reuse` set.
#[derive(Debug, Clone)]
pub struct ReusedOutput {
    pub section_id: SectionId,
    pub generated_content: String,
    pub content_hash: String,
    pub validation_result: ValidationResult,
}

/// One end-to-end pipeline run.
pub struct RunRequest {
    pub document_id: DocumentId,
    pub version_intent: i32,
    pub client_data: Value,
    pub section_overrides: HashMap<SectionId, Value>,
    pub reused_outputs: Vec<ReusedOutput>,
    pub force_rerender: bool,
    pub correlation_id: Option<String>,
}

pub struct RunOutcome {
    pub document_version: DocumentVersion,
    pub rendered_document: RenderedDocument,
}

fn apply_override(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (k, v) in overlay_map {
                apply_override(base_map.entry(k.clone()).or_insert(Value::Null), v);
            }
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value.clone();
        }
    }
}

/// Builds the terminal `unexpected_error` output recorded for a section
/// whose `invoke_with_retries` call faulted instead of resolving to a
/// normal success or classified failure — the §4.9 isolation fallback that
/// keeps one section's internal fault from aborting its peers.
fn unexpected_error_output(gen_input: &GenerationInput, section: &Section, max_retries: u32) -> Result<SectionOutput, DomainError> {
    SectionOutput::new(gen_input.id, section.id, gen_input.sequence_order, max_retries)
        .mark_in_progress()?
        .mark_failed(FailureType::UnexpectedError)
}

impl PipelineCoordinator {
    pub async fn run(&self, request: RunRequest) -> Result<RunOutcome, DomainError> {
        let document = self.documents.find_by_id(request.document_id).await?.ok_or_else(|| {
            DomainError::new(ErrorCode::NotFound, format!("document {} not found", request.document_id))
        })?;

        let template_version = self.template_versions.find_by_id(document.template_version_id).await?.ok_or_else(|| {
            DomainError::new(ErrorCode::NotFound, format!("template version {} not found", document.template_version_id))
        })?;

        let sections = self.sections.find_by_template_version(template_version.id).await?;

        let input_batch = self.prepare_inputs(&request, &document, &template_version, &sections).await?;
        let output_batch = self.generate_sections(&request, &sections, &input_batch).await?;
        let assembled = self.assemble(&request, &document, &template_version, &sections, &output_batch).await?;
        let rendered = self.render(&request, &document, &assembled).await?;
        let document_version = self.version(&request, &document, &input_batch, &rendered).await?;

        Ok(RunOutcome { document_version, rendered_document: rendered })
    }

    /// Renders an already-assembled document directly, without running the
    /// earlier stages. Backs `POST /render`: `NotFound` if no assembled
    /// document exists for `(document_id, version_intent)`,
    /// `MissingValidatedContent` if it exists but hasn't passed assembly's
    /// own self-consistency check yet, `AlreadyRendered` if a rendering is
    /// already immutable and `force_rerender` was not set.
    pub async fn render_standalone(
        &self,
        document_id: DocumentId,
        version_intent: i32,
        force_rerender: bool,
        correlation_id: Option<String>,
    ) -> Result<RenderedDocument, DomainError> {
        let document = self
            .documents
            .find_by_id(document_id)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::NotFound, format!("document {document_id} not found")))?;

        let assembled = self
            .assembled_documents
            .assembled_by(document_id, version_intent)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::NotFound, format!("no assembled document for document {document_id} version {version_intent}")))?;

        if assembled.status != AssemblyStatus::Validated {
            return Err(DomainError::new(ErrorCode::MissingValidatedContent, "assembled document has not passed self-consistency validation"));
        }

        if let Some(existing) = self.rendered_documents.rendered_by(document_id, version_intent).await? {
            if existing.is_immutable && !force_rerender {
                return Err(DomainError::new(ErrorCode::AlreadyRendered, format!("document {document_id} version {version_intent} is already rendered")));
            }
        }

        let request = RunRequest {
            document_id,
            version_intent,
            client_data: Value::Null,
            section_overrides: HashMap::new(),
            reused_outputs: Vec::new(),
            force_rerender,
            correlation_id,
        };
        self.render(&request, &document, &assembled).await
    }

    async fn audit(&self, entity_type: EntityType, entity_id: String, stage: &str, action: &str, artifact_id: Option<String>, correlation_id: &Option<String>) {
        let mut entry = AuditLogEntry::stage_event(entity_type, entity_id, stage, action, artifact_id);
        if let Some(cid) = correlation_id {
            entry = entry.with_correlation_id(cid.clone());
        }
        if let Err(e) = self.audit_log.append(&entry).await {
            warn!(error = %e, stage, action, "failed to append audit log entry");
        }
    }

    async fn prepare_inputs(
        &self,
        request: &RunRequest,
        document: &Document,
        template_version: &TemplateVersion,
        sections: &[Section],
    ) -> Result<GenerationInputBatch, DomainError> {
        let entity_id = document.id.to_string();
        self.audit(EntityType::Document, entity_id.clone(), "input_preparation", "started", None, &request.correlation_id).await;

        match self.prepare_inputs_inner(request, template_version, sections).await {
            Ok(batch) => {
                self.audit(EntityType::GenerationInputBatch, entity_id, "input_preparation", "completed", Some(batch.id.to_string()), &request.correlation_id).await;
                Ok(batch)
            }
            Err(e) => {
                self.audit(EntityType::Document, entity_id, "input_preparation", "failed", None, &request.correlation_id).await;
                Err(e)
            }
        }
    }

    async fn prepare_inputs_inner(
        &self,
        request: &RunRequest,
        template_version: &TemplateVersion,
        sections: &[Section],
    ) -> Result<GenerationInputBatch, DomainError> {
        if let Some(existing) = self.input_batches.batch_by(request.document_id, request.version_intent).await? {
            if existing.is_immutable {
                return Ok(existing);
            }
        }

        let mut inputs = Vec::new();
        for section in sections.iter().filter(|s| s.is_dynamic()) {
            let override_value = request.section_overrides.get(&section.id);
            let hash = input_hash(&section.id.to_string(), &request.client_data, override_value)
                .map_err(|e| DomainError::new(ErrorCode::InternalError, e.to_string()))?;

            let mut client_data = request.client_data.clone();
            if let Some(over) = override_value {
                apply_override(&mut client_data, over);
            }

            inputs.push(GenerationInput::new(
                section.id,
                section.sequence_order,
                section.structural_path.clone(),
                Value::Null,
                section.prompt_config.clone().unwrap_or(Value::Null),
                client_data,
                Value::Null,
                hash,
            ));
        }

        let batch = GenerationInputBatch::new(request.document_id, template_version.id, request.version_intent, inputs).mark_validated()?;
        self.input_batches.save(&batch).await?;
        Ok(batch)
    }

    async fn generate_sections(
        &self,
        request: &RunRequest,
        sections: &[Section],
        input_batch: &GenerationInputBatch,
    ) -> Result<SectionOutputBatch, DomainError> {
        let entity_id = input_batch.id.to_string();
        self.audit(EntityType::GenerationInputBatch, entity_id.clone(), "section_generation", "started", None, &request.correlation_id).await;

        match self.generate_sections_inner(request, sections, input_batch).await {
            Ok(batch) => {
                self.audit(EntityType::SectionOutputBatch, entity_id, "section_generation", "completed", Some(batch.id.to_string()), &request.correlation_id).await;
                Ok(batch)
            }
            Err(e) => {
                self.audit(EntityType::GenerationInputBatch, entity_id, "section_generation", "failed", None, &request.correlation_id).await;
                Err(e)
            }
        }
    }

    async fn generate_sections_inner(
        &self,
        request: &RunRequest,
        sections: &[Section],
        input_batch: &GenerationInputBatch,
    ) -> Result<SectionOutputBatch, DomainError> {
        if let Some(existing) = self.output_batches.find_by_input_batch(input_batch.id).await? {
            if existing.is_immutable {
                return Ok(existing);
            }
        }

        let dynamic_sections: Vec<&Section> = sections.iter().filter(|s| s.is_dynamic()).collect();
        let reused: HashMap<SectionId, &ReusedOutput> = request.reused_outputs.iter().map(|r| (r.section_id, r)).collect();

        let mut batch = SectionOutputBatch::new(input_batch.id, request.document_id, request.version_intent, dynamic_sections.len()).mark_in_progress()?;

        for section in dynamic_sections {
            let gen_input = input_batch
                .input_for_section(section.id)
                .ok_or_else(|| DomainError::new(ErrorCode::MissingInput, format!("no generation input for section {}", section.id)))?;

            let output = if let Some(reuse) = reused.get(&section.id) {
                SectionOutput::new(gen_input.id, section.id, gen_input.sequence_order, self.retry_policy.max_retries)
                    .mark_in_progress()?
                    .mark_completed(reuse.generated_content.clone(), reuse.validation_result.clone())?
                    .mark_validated(reuse.content_hash.clone())?
            } else {
                match self.invoke_with_retries(gen_input, section).await {
                    Ok(output) => output,
                    Err(e) => {
                        warn!(error = %e, section_id = %section.id, "section generation faulted, recording as unexpected_error without aborting peers");
                        unexpected_error_output(gen_input, section, self.retry_policy.max_retries)?
                    }
                }
            };

            batch.record_outcome(output)?;
        }

        let batch = batch.mark_completed()?;
        self.output_batches.save(&batch).await?;
        Ok(batch)
    }

    async fn invoke_with_retries(&self, gen_input: &GenerationInput, section: &Section) -> Result<SectionOutput, DomainError> {
        let mut output = SectionOutput::new(gen_input.id, section.id, gen_input.sequence_order, self.retry_policy.max_retries).mark_in_progress()?;

        loop {
            let prompt = assemble_prompt(&PromptInputs {
                structural_path: &gen_input.structural_path,
                prompt_config: &gen_input.prompt_config,
                hierarchy_context: &gen_input.hierarchy_context,
                client_data: &gen_input.client_data,
                surrounding_context: &gen_input.surrounding_context,
            });

            let constraints = InvocationConstraints::default();
            let request = InvocationRequest::new(gen_input.id.to_string(), section.id, prompt, constraints);
            let response = self.model_endpoint.invoke(request).await;

            if !response.is_successful {
                let failure_type = FailureType::GenerationFailure;
                let message = response.error_message.unwrap_or_else(|| "model invocation failed".to_string());
                let attempt = RetryAttempt::new(output.retry_count + 1, failure_type, message);
                if self.retry_policy.should_retry(failure_type, output.retry_count) {
                    output = output.mark_retrying(attempt)?.mark_in_progress()?;
                    continue;
                }
                return output.mark_failed(FailureType::RetryExhaustion);
            }

            let validation_result = validate(&response.raw_output, &self.validator_constraints);
            if validation_result.is_valid() {
                let content_hash = sha256_hex_str(&response.raw_output);
                return output.mark_completed(response.raw_output, validation_result)?.mark_validated(content_hash);
            }

            let category = validation_result
                .failure_category()
                .expect("an invalid ValidationResult always has a failure category");
            let failure_type = FailureType::from(category);
            let attempt = RetryAttempt::new(output.retry_count + 1, failure_type, format!("{validation_result:?}"));
            if self.retry_policy.should_retry(failure_type, output.retry_count) {
                output = output.mark_retrying(attempt)?.mark_in_progress()?;
                continue;
            }
            return output.mark_failed(failure_type);
        }
    }

    async fn assemble(
        &self,
        request: &RunRequest,
        document: &Document,
        template_version: &TemplateVersion,
        sections: &[Section],
        output_batch: &SectionOutputBatch,
    ) -> Result<AssembledDocument, DomainError> {
        let entity_id = output_batch.id.to_string();
        self.audit(EntityType::SectionOutputBatch, entity_id.clone(), "assembly", "started", None, &request.correlation_id).await;

        match self.assemble_inner(document, template_version, sections, output_batch).await {
            Ok(assembled) => {
                self.audit(EntityType::AssembledDocument, entity_id, "assembly", "completed", Some(assembled.id.to_string()), &request.correlation_id).await;
                Ok(assembled)
            }
            Err(e) => {
                self.audit(EntityType::SectionOutputBatch, entity_id, "assembly", "failed", None, &request.correlation_id).await;
                Err(e)
            }
        }
    }

    async fn assemble_inner(
        &self,
        document: &Document,
        template_version: &TemplateVersion,
        sections: &[Section],
        output_batch: &SectionOutputBatch,
    ) -> Result<AssembledDocument, DomainError> {
        if let Some(existing) = self.assembled_documents.assembled_by(document.id, output_batch.version_intent).await? {
            if existing.is_immutable {
                return Ok(existing);
            }
        }

        let parsed_key = template_version
            .parsed_blob_key
            .clone()
            .ok_or_else(|| DomainError::new(ErrorCode::MissingValidatedContent, "template version has not been parsed"))?;
        let parsed_bytes = self
            .object_store
            .get(&parsed_key)
            .await
            .map_err(|e| DomainError::new(ErrorCode::PersistenceFailed, e.to_string()))?
            .ok_or_else(|| DomainError::new(ErrorCode::NotFound, format!("parsed blob {parsed_key} not found")))?;
        let parsed: ParsedDocument =
            serde_json::from_slice(&parsed_bytes).map_err(|e| DomainError::new(ErrorCode::InvalidDocument, e.to_string()))?;

        let mut assembled_structure = Vec::with_capacity(parsed.blocks.len());
        let mut static_blocks_count = 0usize;
        let mut dynamic_blocks_count = 0usize;

        for block in &parsed.blocks {
            let section = sections
                .iter()
                .find(|s| s.structural_path == block.structural_path)
                .ok_or_else(|| DomainError::new(ErrorCode::AssemblyInconsistent, format!("block {} has no owning section", block.structural_path)))?;

            match section.section_type {
                SectionType::Static => {
                    assembled_structure.push(block.clone());
                    static_blocks_count += 1;
                }
                SectionType::Dynamic => {
                    let output = output_batch
                        .output_for_section(section.id)
                        .ok_or_else(|| DomainError::new(ErrorCode::MissingValidatedContent, format!("no section output for section {}", section.id)))?;
                    let content = output
                        .generated_content
                        .clone()
                        .ok_or_else(|| DomainError::new(ErrorCode::MissingValidatedContent, format!("section {} has no validated content", section.id)))?;
                    assembled_structure.push(Block::new(block.structural_path.clone(), block.sequence_order, BlockType::Paragraph { text: content }));
                    dynamic_blocks_count += 1;
                }
            }
        }

        let counts = BlockCounts {
            total_blocks: assembled_structure.len(),
            static_blocks_count,
            dynamic_blocks_count,
            injected_sections_count: dynamic_blocks_count,
        };
        let mut metadata = HashMap::new();
        metadata.insert("template_version_id".to_string(), template_version.id.to_string());
        let assembly_hash =
            sha256_hex_canonical_json(&assembled_structure).map_err(|e| DomainError::new(ErrorCode::InternalError, e.to_string()))?;

        let assembled = AssembledDocument::new_pending(document.id, template_version.id, output_batch.version_intent, output_batch.id)
            .mark_in_progress()?
            .mark_completed(assembled_structure, parsed.headers.clone(), parsed.footers.clone(), metadata, counts, assembly_hash)?
            .mark_validated()?;
        self.assembled_documents.save(&assembled).await?;
        Ok(assembled)
    }

    async fn render(&self, request: &RunRequest, document: &Document, assembled: &AssembledDocument) -> Result<RenderedDocument, DomainError> {
        let entity_id = assembled.id.to_string();
        self.audit(EntityType::AssembledDocument, entity_id.clone(), "rendering", "started", None, &request.correlation_id).await;

        match self.render_inner(request, document, assembled).await {
            Ok(rendered) => {
                self.audit(EntityType::RenderedDocument, entity_id, "rendering", "completed", Some(rendered.id.to_string()), &request.correlation_id).await;
                Ok(rendered)
            }
            Err(e) => {
                self.audit(EntityType::AssembledDocument, entity_id, "rendering", "failed", None, &request.correlation_id).await;
                Err(e)
            }
        }
    }

    async fn render_inner(&self, request: &RunRequest, document: &Document, assembled: &AssembledDocument) -> Result<RenderedDocument, DomainError> {
        if let Some(existing) = self.rendered_documents.rendered_by(document.id, assembled.version_intent).await? {
            if existing.is_immutable && !request.force_rerender {
                return Ok(existing);
            }
        }

        let bytes = self.renderer.render(assembled).await.map_err(|e| DomainError::new(ErrorCode::RenderFailed, e.to_string()))?;
        let validation = self.renderer.validate_rendered(&bytes).map_err(|e| DomainError::new(ErrorCode::RenderFailed, e.to_string()))?;
        if !validation.is_valid_container {
            return Err(DomainError::new(ErrorCode::InvalidDocument, "rendered bytes failed container validation"));
        }

        let content_hash = sha256_hex(&bytes);
        let key = keys::document_output(&document.id.to_string(), assembled.version_intent);
        self.object_store.put(&key, &bytes).await.map_err(|e| DomainError::new(ErrorCode::PersistenceFailed, e.to_string()))?;

        let reloaded = self
            .object_store
            .get(&key)
            .await
            .map_err(|e| DomainError::new(ErrorCode::PersistenceFailed, e.to_string()))?
            .ok_or_else(|| DomainError::new(ErrorCode::PersistenceFailed, "rendered blob vanished immediately after write"))?;
        let reload_hash = sha256_hex(&reloaded);

        let block_counts = RenderedBlockCounts {
            paragraphs: validation.paragraph_count as usize,
            tables: validation.table_count as usize,
            ..Default::default()
        };

        let rendered = RenderedDocument::new_pending(assembled.id, document.id, assembled.version_intent)
            .mark_in_progress()?
            .mark_completed(key, reloaded.len() as u64, block_counts)?;

        if reload_hash != content_hash {
            let failed = rendered.mark_failed()?;
            self.rendered_documents.save(&failed).await?;
            return Err(DomainError::new(ErrorCode::PersistenceFailed, "rendered blob failed reload-hash verification"));
        }

        let rendered = rendered.mark_validated(content_hash)?;
        self.rendered_documents.save(&rendered).await?;
        Ok(rendered)
    }

    async fn version(
        &self,
        request: &RunRequest,
        document: &Document,
        input_batch: &GenerationInputBatch,
        rendered: &RenderedDocument,
    ) -> Result<DocumentVersion, DomainError> {
        let entity_id = rendered.id.to_string();
        self.audit(EntityType::RenderedDocument, entity_id.clone(), "versioning", "started", None, &request.correlation_id).await;

        match self.version_inner(document, input_batch, rendered).await {
            Ok(document_version) => {
                self.audit(EntityType::DocumentVersion, entity_id, "versioning", "completed", Some(document_version.id.to_string()), &request.correlation_id).await;
                Ok(document_version)
            }
            Err(e) => {
                self.audit(EntityType::RenderedDocument, entity_id, "versioning", "failed", None, &request.correlation_id).await;
                Err(e)
            }
        }
    }

    async fn version_inner(&self, document: &Document, input_batch: &GenerationInputBatch, rendered: &RenderedDocument) -> Result<DocumentVersion, DomainError> {
        if let Some(existing) = self.document_versions.find_by_document_and_version(document.id, rendered.version).await? {
            return Ok(existing);
        }

        let metadata = GenerationMetadata::new(
            input_batch.content_hash.clone().unwrap_or_default(),
            rendered.content_hash.clone().unwrap_or_default(),
        );
        let document_version = DocumentVersion::new(document.id, rendered.version, rendered.output_blob_key.clone().unwrap_or_default(), metadata);
        self.document_versions.save(&document_version).await?;

        if rendered.version > document.current_version {
            let advanced = document.clone().advance_to(rendered.version);
            self.documents.update(&advanced).await?;
        }

        Ok(document_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{GenerationInputBatchId, TemplateVersionId};
    use crate::domain::generation::OutputStatus;
    use serde_json::json;

    #[test]
    fn unexpected_error_output_is_an_immutable_failed_output_without_aborting_the_batch() {
        let gen_input = GenerationInput::new(SectionId::new(1), 0, "body/introduction", json!({}), json!({}), json!({}), json!({}), "hash");
        let section = Section::new_dynamic(SectionId::new(1), TemplateVersionId::new(), "body/introduction", 0, json!({}));

        let output = unexpected_error_output(&gen_input, &section, 3).expect("a fresh output always transitions to failed");

        assert_eq!(output.status, OutputStatus::Failed);
        assert_eq!(output.error_code, Some(FailureType::UnexpectedError));
        assert!(output.is_immutable);
        assert!(output.is_terminal());
    }

    #[test]
    fn unexpected_error_output_still_records_into_an_in_progress_batch() {
        let gen_input = GenerationInput::new(SectionId::new(1), 0, "body/introduction", json!({}), json!({}), json!({}), json!({}), "hash");
        let section = Section::new_dynamic(SectionId::new(1), TemplateVersionId::new(), "body/introduction", 0, json!({}));
        let output = unexpected_error_output(&gen_input, &section, 3).unwrap();

        let mut batch = SectionOutputBatch::new(GenerationInputBatchId::new(), DocumentId::new(), 1, 1).mark_in_progress().unwrap();
        batch.record_outcome(output).expect("an unexpected_error output is a valid terminal outcome for its section");

        assert_eq!(batch.failed_sections, 1);
        assert_eq!(batch.completed_sections, 0);
    }
}
