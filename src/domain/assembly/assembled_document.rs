//! `AssembledDocument` — the spliced block structure produced by the
//! Assembler (C5), ready for rendering.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    AssembledDocumentId, DocumentId, DomainError, ErrorCode, SectionOutputBatchId, StateMachine, TemplateVersionId,
};
use crate::domain::template::Block;

/// Lifecycle of an `AssembledDocument`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Validated,
}

impl StateMachine for AssemblyStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use AssemblyStatus::*;
        matches!(
            (self, target),
            (Pending, InProgress) | (InProgress, Completed) | (InProgress, Failed) | (Completed, Validated)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use AssemblyStatus::*;
        match self {
            Pending => vec![InProgress],
            InProgress => vec![Completed, Failed],
            Completed => vec![Validated],
            Failed | Validated => vec![],
        }
    }
}

/// Block-composition counters, checked by the self-consistency invariant
/// before an `AssembledDocument` is allowed to become `validated`:
/// `dynamic_blocks_count == injected_sections_count` and
/// `total_blocks == static_blocks_count + dynamic_blocks_count`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockCounts {
    pub total_blocks: usize,
    pub static_blocks_count: usize,
    pub dynamic_blocks_count: usize,
    pub injected_sections_count: usize,
}

impl BlockCounts {
    pub fn is_self_consistent(&self) -> bool {
        self.dynamic_blocks_count == self.injected_sections_count
            && self.total_blocks == self.static_blocks_count + self.dynamic_blocks_count
    }
}

/// The spliced block structure for one `(document_id, version_intent)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledDocument {
    pub id: AssembledDocumentId,
    pub document_id: DocumentId,
    pub template_version_id: TemplateVersionId,
    pub version_intent: i32,
    pub section_output_batch_id: SectionOutputBatchId,
    pub status: AssemblyStatus,
    pub assembly_hash: Option<String>,
    pub counts: BlockCounts,
    pub assembled_structure: Vec<Block>,
    pub headers: Vec<Block>,
    pub footers: Vec<Block>,
    pub metadata: HashMap<String, String>,
    pub is_immutable: bool,
}

impl AssembledDocument {
    pub fn new_pending(
        document_id: DocumentId,
        template_version_id: TemplateVersionId,
        version_intent: i32,
        section_output_batch_id: SectionOutputBatchId,
    ) -> Self {
        Self {
            id: AssembledDocumentId::new(),
            document_id,
            template_version_id,
            version_intent,
            section_output_batch_id,
            status: AssemblyStatus::Pending,
            assembly_hash: None,
            counts: BlockCounts::default(),
            assembled_structure: Vec::new(),
            headers: Vec::new(),
            footers: Vec::new(),
            metadata: HashMap::new(),
            is_immutable: false,
        }
    }

    fn guard_transition(&self, target: AssemblyStatus) -> Result<(), DomainError> {
        if self.is_immutable {
            return Err(DomainError::new(ErrorCode::ImmutabilityViolation, format!("assembled document {} is immutable", self.id)));
        }
        self.status
            .transition_to(target)
            .map_err(|e| DomainError::new(ErrorCode::InvalidTransition, e.to_string()))?;
        Ok(())
    }

    pub fn mark_in_progress(mut self) -> Result<Self, DomainError> {
        self.guard_transition(AssemblyStatus::InProgress)?;
        self.status = AssemblyStatus::InProgress;
        Ok(self)
    }

    /// The Assembler finished splicing; the structure is set but not yet
    /// self-consistency-checked.
    pub fn mark_completed(
        mut self,
        assembled_structure: Vec<Block>,
        headers: Vec<Block>,
        footers: Vec<Block>,
        metadata: HashMap<String, String>,
        counts: BlockCounts,
        assembly_hash: impl Into<String>,
    ) -> Result<Self, DomainError> {
        self.guard_transition(AssemblyStatus::Completed)?;
        self.assembled_structure = assembled_structure;
        self.headers = headers;
        self.footers = footers;
        self.metadata = metadata;
        self.counts = counts;
        self.assembly_hash = Some(assembly_hash.into());
        self.status = AssemblyStatus::Completed;
        Ok(self)
    }

    pub fn mark_failed(mut self) -> Result<Self, DomainError> {
        self.guard_transition(AssemblyStatus::Failed)?;
        self.status = AssemblyStatus::Failed;
        Ok(self)
    }

    /// Freezes the document, but only once the block-counts self-consistency
    /// check passes — an inconsistent structure must never reach `validated`.
    pub fn mark_validated(mut self) -> Result<Self, DomainError> {
        if !self.counts.is_self_consistent() {
            return Err(DomainError::new(ErrorCode::AssemblyInconsistent, format!("assembled document {} fails block-count self-consistency", self.id)));
        }
        self.guard_transition(AssemblyStatus::Validated)?;
        self.status = AssemblyStatus::Validated;
        self.is_immutable = true;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::template::BlockType;

    fn consistent_counts() -> BlockCounts {
        BlockCounts { total_blocks: 5, static_blocks_count: 2, dynamic_blocks_count: 3, injected_sections_count: 3 }
    }

    fn sample() -> AssembledDocument {
        AssembledDocument::new_pending(DocumentId::new(), TemplateVersionId::new(), 1, SectionOutputBatchId::new())
    }

    fn blocks() -> Vec<Block> {
        vec![Block::new("body/0", 0, BlockType::Paragraph { text: "hi".into() })]
    }

    #[test]
    fn validating_requires_self_consistent_counts() {
        let doc = sample().mark_in_progress().unwrap();
        let doc = doc
            .mark_completed(blocks(), vec![], vec![], HashMap::new(), consistent_counts(), "hash1")
            .unwrap();
        let doc = doc.mark_validated().unwrap();
        assert!(doc.is_immutable);
    }

    #[test]
    fn inconsistent_counts_reject_validation() {
        let bad_counts = BlockCounts { total_blocks: 5, static_blocks_count: 2, dynamic_blocks_count: 2, injected_sections_count: 3 };
        let doc = sample().mark_in_progress().unwrap();
        let doc = doc.mark_completed(blocks(), vec![], vec![], HashMap::new(), bad_counts, "hash1").unwrap();
        let err = doc.mark_validated().unwrap_err();
        assert_eq!(err.code, ErrorCode::AssemblyInconsistent);
    }

    #[test]
    fn cannot_transition_straight_to_validated() {
        let err = sample().mark_validated().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
    }
}
