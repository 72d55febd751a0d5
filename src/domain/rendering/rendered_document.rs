//! `RenderedDocument` — the binary artifact produced by the Renderer
//! Adapter (C6).

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AssembledDocumentId, DocumentId, DomainError, ErrorCode, RenderedDocumentId, StateMachine};

/// Lifecycle of a `RenderedDocument`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Validated,
}

impl StateMachine for RenderStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use RenderStatus::*;
        matches!(
            (self, target),
            (Pending, InProgress) | (InProgress, Completed) | (InProgress, Failed) | (Completed, Validated) | (Completed, Failed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use RenderStatus::*;
        match self {
            Pending => vec![InProgress],
            InProgress => vec![Completed, Failed],
            Completed => vec![Validated, Failed],
            Failed | Validated => vec![],
        }
    }
}

/// Per-block-type counts extracted from the rendered binary, compared
/// against the assembled structure's counts as part of C6's own validator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedBlockCounts {
    pub paragraphs: usize,
    pub headings: usize,
    pub tables: usize,
    pub lists: usize,
    pub page_breaks: usize,
    pub section_breaks: usize,
}

/// The binary artifact for one `(document_id, version)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedDocument {
    pub id: RenderedDocumentId,
    pub assembled_document_id: AssembledDocumentId,
    pub document_id: DocumentId,
    pub version: i32,
    pub status: RenderStatus,
    pub output_blob_key: Option<String>,
    pub content_hash: Option<String>,
    pub file_size: Option<u64>,
    pub block_counts: RenderedBlockCounts,
    pub is_immutable: bool,
}

impl RenderedDocument {
    pub fn new_pending(assembled_document_id: AssembledDocumentId, document_id: DocumentId, version: i32) -> Self {
        Self {
            id: RenderedDocumentId::new(),
            assembled_document_id,
            document_id,
            version,
            status: RenderStatus::Pending,
            output_blob_key: None,
            content_hash: None,
            file_size: None,
            block_counts: RenderedBlockCounts::default(),
            is_immutable: false,
        }
    }

    fn guard_transition(&self, target: RenderStatus) -> Result<(), DomainError> {
        if self.is_immutable {
            return Err(DomainError::new(ErrorCode::ImmutabilityViolation, format!("rendered document {} is immutable", self.id)));
        }
        self.status
            .transition_to(target)
            .map_err(|e| DomainError::new(ErrorCode::InvalidTransition, e.to_string()))?;
        Ok(())
    }

    pub fn mark_in_progress(mut self) -> Result<Self, DomainError> {
        self.guard_transition(RenderStatus::InProgress)?;
        self.status = RenderStatus::InProgress;
        Ok(self)
    }

    /// The codec produced bytes and they were written to the object store,
    /// but not yet confirmed by the store-reload hash comparison.
    pub fn mark_completed(mut self, output_blob_key: impl Into<String>, file_size: u64, block_counts: RenderedBlockCounts) -> Result<Self, DomainError> {
        self.guard_transition(RenderStatus::Completed)?;
        self.output_blob_key = Some(output_blob_key.into());
        self.file_size = Some(file_size);
        self.block_counts = block_counts;
        self.status = RenderStatus::Completed;
        Ok(self)
    }

    pub fn mark_failed(mut self) -> Result<Self, DomainError> {
        self.guard_transition(RenderStatus::Failed)?;
        self.status = RenderStatus::Failed;
        Ok(self)
    }

    /// Freezes the document once the reload-and-compare hash check passes.
    /// A caller that detects a mismatch must call `mark_failed` with
    /// `ErrorCode::PersistenceFailed` instead.
    pub fn mark_validated(mut self, content_hash: impl Into<String>) -> Result<Self, DomainError> {
        self.guard_transition(RenderStatus::Validated)?;
        self.content_hash = Some(content_hash.into());
        self.status = RenderStatus::Validated;
        self.is_immutable = true;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RenderedDocument {
        RenderedDocument::new_pending(AssembledDocumentId::new(), DocumentId::new(), 1)
    }

    #[test]
    fn happy_path_freezes_on_validated() {
        let doc = sample()
            .mark_in_progress()
            .unwrap()
            .mark_completed("documents/d1/1/rendered.docx", 20480, RenderedBlockCounts { paragraphs: 3, ..Default::default() })
            .unwrap()
            .mark_validated("renderedhash")
            .unwrap();
        assert!(doc.is_immutable);
        assert_eq!(doc.status, RenderStatus::Validated);
    }

    #[test]
    fn reload_mismatch_can_still_fail_from_completed() {
        let doc = sample()
            .mark_in_progress()
            .unwrap()
            .mark_completed("documents/d1/1/rendered.docx", 20480, RenderedBlockCounts::default())
            .unwrap();
        let doc = doc.mark_failed().unwrap();
        assert_eq!(doc.status, RenderStatus::Failed);
        assert!(!doc.is_immutable);
    }

    #[test]
    fn cannot_mutate_once_validated() {
        let doc = sample()
            .mark_in_progress()
            .unwrap()
            .mark_completed("k", 1, RenderedBlockCounts::default())
            .unwrap()
            .mark_validated("h")
            .unwrap();
        let err = doc.mark_failed().unwrap_err();
        assert_eq!(err.code, ErrorCode::ImmutabilityViolation);
    }
}
