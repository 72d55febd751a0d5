//! `SectionOutputBatch` — the result set produced by the Batch Executor
//! (C4), keyed 1:1 to a `GenerationInputBatch`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    DocumentId, DomainError, ErrorCode, GenerationInputBatchId, GenerationInputId, SectionId, SectionOutputBatchId,
    SectionOutputId, StateMachine,
};
use crate::domain::generation::retry::{FailureType, RetryAttempt};
use crate::domain::generation::validator::ValidationResult;

/// Lifecycle of one `SectionOutput`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStatus {
    Pending,
    InProgress,
    Completed,
    Retrying,
    Failed,
    Validated,
}

impl StateMachine for OutputStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use OutputStatus::*;
        matches!(
            (self, target),
            (Pending, InProgress)
                | (InProgress, Completed)
                | (InProgress, Retrying)
                | (InProgress, Failed)
                | (Retrying, InProgress)
                | (Retrying, Failed)
                | (Completed, Validated)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use OutputStatus::*;
        match self {
            Pending => vec![InProgress],
            InProgress => vec![Completed, Retrying, Failed],
            Retrying => vec![InProgress, Failed],
            Completed => vec![Validated],
            Failed | Validated => vec![],
        }
    }
}

/// One section's generation outcome within a `SectionOutputBatch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionOutput {
    pub id: SectionOutputId,
    pub generation_input_id: GenerationInputId,
    pub section_id: SectionId,
    pub sequence_order: i32,
    pub status: OutputStatus,
    pub generated_content: Option<String>,
    pub content_length: usize,
    pub content_hash: Option<String>,
    pub error_code: Option<FailureType>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub retry_history: Vec<RetryAttempt>,
    pub validation_result: Option<ValidationResult>,
    pub generation_metadata: HashMap<String, String>,
    pub is_immutable: bool,
}

impl SectionOutput {
    pub fn new(generation_input_id: GenerationInputId, section_id: SectionId, sequence_order: i32, max_retries: u32) -> Self {
        Self {
            id: SectionOutputId::new(),
            generation_input_id,
            section_id,
            sequence_order,
            status: OutputStatus::Pending,
            generated_content: None,
            content_length: 0,
            content_hash: None,
            error_code: None,
            retry_count: 0,
            max_retries,
            retry_history: Vec::new(),
            validation_result: None,
            generation_metadata: HashMap::new(),
            is_immutable: false,
        }
    }

    fn guard_transition(&self, target: OutputStatus) -> Result<(), DomainError> {
        if self.is_immutable {
            return Err(DomainError::new(ErrorCode::ImmutabilityViolation, format!("section output {} is immutable", self.id)));
        }
        self.status
            .transition_to(target)
            .map_err(|e| DomainError::new(ErrorCode::InvalidTransition, e.to_string()))?;
        Ok(())
    }

    pub fn mark_in_progress(mut self) -> Result<Self, DomainError> {
        self.guard_transition(OutputStatus::InProgress)?;
        self.status = OutputStatus::InProgress;
        Ok(self)
    }

    /// Raw content produced a validatable string; moves to `Completed`
    /// pending the final `mark_validated` once its hash is computed.
    pub fn mark_completed(mut self, content: impl Into<String>, validation_result: ValidationResult) -> Result<Self, DomainError> {
        self.guard_transition(OutputStatus::Completed)?;
        let content = content.into();
        self.content_length = content.chars().count();
        self.generated_content = Some(content);
        self.validation_result = Some(validation_result);
        self.status = OutputStatus::Completed;
        Ok(self)
    }

    /// Freezes a completed output as the section's final, immutable content.
    pub fn mark_validated(mut self, content_hash: impl Into<String>) -> Result<Self, DomainError> {
        self.guard_transition(OutputStatus::Validated)?;
        self.content_hash = Some(content_hash.into());
        self.status = OutputStatus::Validated;
        self.is_immutable = true;
        Ok(self)
    }

    /// Appends a `RetryAttempt` and loops back to `InProgress` for another try.
    pub fn mark_retrying(mut self, attempt: RetryAttempt) -> Result<Self, DomainError> {
        self.guard_transition(OutputStatus::Retrying)?;
        self.retry_count += 1;
        self.retry_history.push(attempt);
        self.status = OutputStatus::Retrying;
        Ok(self)
    }

    /// Terminal failure, whether a not-retryable classification or retry
    /// exhaustion (`error_code = FailureType::RetryExhaustion`).
    pub fn mark_failed(mut self, error_code: FailureType) -> Result<Self, DomainError> {
        self.guard_transition(OutputStatus::Failed)?;
        self.error_code = Some(error_code);
        self.status = OutputStatus::Failed;
        self.is_immutable = true;
        Ok(self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, OutputStatus::Validated | OutputStatus::Failed)
    }
}

/// Lifecycle of the batch as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputBatchStatus {
    Pending,
    InProgress,
    Completed,
}

impl StateMachine for OutputBatchStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!((self, target), (OutputBatchStatus::Pending, OutputBatchStatus::InProgress) | (OutputBatchStatus::InProgress, OutputBatchStatus::Completed))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            OutputBatchStatus::Pending => vec![OutputBatchStatus::InProgress],
            OutputBatchStatus::InProgress => vec![OutputBatchStatus::Completed],
            OutputBatchStatus::Completed => vec![],
        }
    }
}

/// The result set produced by the Batch Executor, keyed 1:1 to an input batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionOutputBatch {
    pub id: SectionOutputBatchId,
    pub input_batch_id: GenerationInputBatchId,
    pub document_id: DocumentId,
    pub version_intent: i32,
    pub status: OutputBatchStatus,
    pub total_sections: usize,
    pub completed_sections: usize,
    pub failed_sections: usize,
    pub is_immutable: bool,
    pub outputs: Vec<SectionOutput>,
}

impl SectionOutputBatch {
    pub fn new(input_batch_id: GenerationInputBatchId, document_id: DocumentId, version_intent: i32, total_sections: usize) -> Self {
        Self {
            id: SectionOutputBatchId::new(),
            input_batch_id,
            document_id,
            version_intent,
            status: OutputBatchStatus::Pending,
            total_sections,
            completed_sections: 0,
            failed_sections: 0,
            is_immutable: false,
            outputs: Vec::new(),
        }
    }

    fn guard_transition(&self, target: OutputBatchStatus) -> Result<(), DomainError> {
        if self.is_immutable {
            return Err(DomainError::new(ErrorCode::ImmutabilityViolation, format!("output batch {} is immutable", self.id)));
        }
        self.status
            .transition_to(target)
            .map_err(|e| DomainError::new(ErrorCode::InvalidTransition, e.to_string()))?;
        Ok(())
    }

    pub fn mark_in_progress(mut self) -> Result<Self, DomainError> {
        self.guard_transition(OutputBatchStatus::InProgress)?;
        self.status = OutputBatchStatus::InProgress;
        Ok(self)
    }

    /// Records one section's terminal outcome. Does not itself complete the
    /// batch — the caller checks `is_fully_resolved()` and calls
    /// `mark_completed` once every section has a terminal output.
    pub fn record_outcome(&mut self, output: SectionOutput) -> Result<(), DomainError> {
        if !output.is_terminal() {
            return Err(DomainError::new(ErrorCode::InternalError, "cannot record a non-terminal section output"));
        }
        match output.status {
            OutputStatus::Validated => self.completed_sections += 1,
            OutputStatus::Failed => self.failed_sections += 1,
            _ => unreachable!("is_terminal() guarantees Validated or Failed"),
        }
        self.outputs.push(output);
        Ok(())
    }

    pub fn is_fully_resolved(&self) -> bool {
        self.completed_sections + self.failed_sections == self.total_sections
    }

    /// Atomically finalizes the batch once every section has resolved.
    pub fn mark_completed(mut self) -> Result<Self, DomainError> {
        if !self.is_fully_resolved() {
            return Err(DomainError::new(ErrorCode::InternalError, "batch has unresolved sections"));
        }
        self.guard_transition(OutputBatchStatus::Completed)?;
        self.status = OutputBatchStatus::Completed;
        self.is_immutable = true;
        Ok(self)
    }

    pub fn output_for_section(&self, section_id: SectionId) -> Option<&SectionOutput> {
        self.outputs.iter().find(|o| o.section_id == section_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::generation::validator::ValidationResult;

    fn validated_output(section_id: i32) -> SectionOutput {
        let out = SectionOutput::new(GenerationInputId::new(), SectionId::new(section_id), 0, 3)
            .mark_in_progress()
            .unwrap()
            .mark_completed("Generated body text.", ValidationResult::default())
            .unwrap();
        out.mark_validated("contenthash").unwrap()
    }

    fn failed_output(section_id: i32) -> SectionOutput {
        SectionOutput::new(GenerationInputId::new(), SectionId::new(section_id), 0, 3)
            .mark_in_progress()
            .unwrap()
            .mark_failed(FailureType::StructuralViolation)
            .unwrap()
    }

    #[test]
    fn completing_then_validating_freezes_output() {
        let out = validated_output(1);
        assert!(out.is_immutable);
        assert_eq!(out.status, OutputStatus::Validated);
    }

    #[test]
    fn retry_loop_increments_retry_count_and_returns_to_in_progress() {
        let out = SectionOutput::new(GenerationInputId::new(), SectionId::new(1), 0, 3).mark_in_progress().unwrap();
        let attempt = RetryAttempt::new(1, FailureType::BoundsViolation, "too short");
        let out = out.mark_retrying(attempt).unwrap();
        assert_eq!(out.retry_count, 1);
        assert_eq!(out.status, OutputStatus::Retrying);
        let out = out.mark_in_progress().unwrap();
        assert_eq!(out.status, OutputStatus::InProgress);
    }

    #[test]
    fn batch_completes_only_once_every_section_resolved() {
        let mut batch = SectionOutputBatch::new(GenerationInputBatchId::new(), DocumentId::new(), 1, 3).mark_in_progress().unwrap();
        batch.record_outcome(validated_output(1)).unwrap();
        batch.record_outcome(validated_output(2)).unwrap();
        assert!(!batch.is_fully_resolved());
        batch.record_outcome(failed_output(3)).unwrap();
        assert!(batch.is_fully_resolved());
        let batch = batch.mark_completed().unwrap();
        assert!(batch.is_immutable);
        assert_eq!(batch.completed_sections, 2);
        assert_eq!(batch.failed_sections, 1);
    }

    #[test]
    fn recording_a_non_terminal_output_is_rejected() {
        let mut batch = SectionOutputBatch::new(GenerationInputBatchId::new(), DocumentId::new(), 1, 1).mark_in_progress().unwrap();
        let in_progress = SectionOutput::new(GenerationInputId::new(), SectionId::new(1), 0, 3).mark_in_progress().unwrap();
        let err = batch.record_outcome(in_progress).unwrap_err();
        assert_eq!(err.code, ErrorCode::InternalError);
    }
}
