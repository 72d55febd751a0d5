//! `GenerationInputBatch` — the frozen input set for producing one
//! `(document, version_intent)`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{
    sha256_hex_canonical_json, DocumentId, DomainError, ErrorCode, GenerationInputBatchId, GenerationInputId,
    SectionId, StateMachine, TemplateVersionId,
};

/// Lifecycle of a `GenerationInputBatch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    Validated,
    Failed,
}

impl StateMachine for BatchStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!((self, target), (BatchStatus::Pending, BatchStatus::Validated) | (BatchStatus::Pending, BatchStatus::Failed))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            BatchStatus::Pending => vec![BatchStatus::Validated, BatchStatus::Failed],
            BatchStatus::Validated | BatchStatus::Failed => vec![],
        }
    }
}

/// One dynamic section's frozen generation input, owned exclusively by its
/// `GenerationInputBatch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationInput {
    pub id: GenerationInputId,
    pub section_id: SectionId,
    pub sequence_order: i32,
    pub structural_path: String,
    pub hierarchy_context: Value,
    pub prompt_config: Value,
    pub client_data: Value,
    pub surrounding_context: Value,
    pub input_hash: String,
}

impl GenerationInput {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        section_id: SectionId,
        sequence_order: i32,
        structural_path: impl Into<String>,
        hierarchy_context: Value,
        prompt_config: Value,
        client_data: Value,
        surrounding_context: Value,
        input_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: GenerationInputId::new(),
            section_id,
            sequence_order,
            structural_path: structural_path.into(),
            hierarchy_context,
            prompt_config,
            client_data,
            surrounding_context,
            input_hash: input_hash.into(),
        }
    }
}

/// The frozen input set for producing `(document_id, version_intent)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationInputBatch {
    pub id: GenerationInputBatchId,
    pub document_id: DocumentId,
    pub template_version_id: TemplateVersionId,
    pub version_intent: i32,
    pub status: BatchStatus,
    pub content_hash: Option<String>,
    pub is_immutable: bool,
    pub inputs: Vec<GenerationInput>,
}

impl GenerationInputBatch {
    pub fn new(document_id: DocumentId, template_version_id: TemplateVersionId, version_intent: i32, inputs: Vec<GenerationInput>) -> Self {
        Self {
            id: GenerationInputBatchId::new(),
            document_id,
            template_version_id,
            version_intent,
            status: BatchStatus::Pending,
            content_hash: None,
            is_immutable: false,
            inputs,
        }
    }

    fn guard_transition(&self, target: BatchStatus) -> Result<(), DomainError> {
        if self.is_immutable {
            return Err(DomainError::new(ErrorCode::ImmutabilityViolation, format!("input batch {} is immutable", self.id)));
        }
        self.status
            .transition_to(target)
            .map_err(|e| DomainError::new(ErrorCode::InvalidTransition, e.to_string()))?;
        Ok(())
    }

    /// A batch may only transition `pending -> validated` once; on success
    /// its `content_hash` is set and every input is frozen alongside it.
    pub fn mark_validated(mut self) -> Result<Self, DomainError> {
        self.guard_transition(BatchStatus::Validated)?;
        let content_hash = sha256_hex_canonical_json(&self.inputs).map_err(|e| DomainError::new(ErrorCode::InternalError, e.to_string()))?;
        self.status = BatchStatus::Validated;
        self.content_hash = Some(content_hash);
        self.is_immutable = true;
        Ok(self)
    }

    pub fn mark_failed(mut self) -> Result<Self, DomainError> {
        self.guard_transition(BatchStatus::Failed)?;
        self.status = BatchStatus::Failed;
        Ok(self)
    }

    pub fn input_for_section(&self, section_id: SectionId) -> Option<&GenerationInput> {
        self.inputs.iter().find(|i| i.section_id == section_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_input(section_id: i32, order: i32) -> GenerationInput {
        GenerationInput::new(
            SectionId::new(section_id),
            order,
            format!("body/section-{section_id}"),
            json!({}),
            json!({}),
            json!({"client_name": "Acme"}),
            json!({}),
            format!("hash-{section_id}"),
        )
    }

    fn sample_batch() -> GenerationInputBatch {
        GenerationInputBatch::new(
            DocumentId::new(),
            TemplateVersionId::new(),
            1,
            vec![sample_input(1, 0), sample_input(2, 1), sample_input(3, 2)],
        )
    }

    #[test]
    fn validating_freezes_batch_and_sets_content_hash() {
        let batch = sample_batch().mark_validated().unwrap();
        assert_eq!(batch.status, BatchStatus::Validated);
        assert!(batch.is_immutable);
        assert!(batch.content_hash.is_some());
    }

    #[test]
    fn cannot_validate_twice() {
        let batch = sample_batch().mark_validated().unwrap();
        let err = batch.mark_validated().unwrap_err();
        assert_eq!(err.code, ErrorCode::ImmutabilityViolation);
    }

    #[test]
    fn input_for_section_finds_by_section_id() {
        let batch = sample_batch();
        let found = batch.input_for_section(SectionId::new(2)).unwrap();
        assert_eq!(found.sequence_order, 1);
    }
}
