//! `TemplateVersion` entity — one parsed revision of a `Template`.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode, StateMachine, TemplateId, TemplateVersionId, Timestamp};

/// Lifecycle of a template version's parse job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParsingStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl StateMachine for ParsingStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ParsingStatus::*;
        matches!(
            (self, target),
            (Pending, InProgress) | (InProgress, Completed) | (InProgress, Failed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ParsingStatus::*;
        match self {
            Pending => vec![InProgress],
            InProgress => vec![Completed, Failed],
            Completed | Failed => vec![],
        }
    }
}

/// One parsed revision of a `Template`.
///
/// Becomes effectively immutable once `parsing_status == Completed`: no
/// mutator on this type accepts a call once `is_immutable` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateVersion {
    pub id: TemplateVersionId,
    pub template_id: TemplateId,
    pub version_number: i32,
    pub source_blob_key: String,
    pub parsed_blob_key: Option<String>,
    pub parsing_status: ParsingStatus,
    pub parsing_error: Option<String>,
    pub content_hash: Option<String>,
    pub created_at: Timestamp,
    pub is_immutable: bool,
}

impl TemplateVersion {
    /// Creates a new pending version.
    pub fn new(template_id: TemplateId, version_number: i32, source_blob_key: impl Into<String>) -> Self {
        Self {
            id: TemplateVersionId::new(),
            template_id,
            version_number,
            source_blob_key: source_blob_key.into(),
            parsed_blob_key: None,
            parsing_status: ParsingStatus::Pending,
            parsing_error: None,
            content_hash: None,
            created_at: Timestamp::now(),
            is_immutable: false,
        }
    }

    fn guard_mutable(&self) -> Result<(), DomainError> {
        if self.is_immutable {
            return Err(DomainError::new(
                ErrorCode::ImmutabilityViolation,
                format!("template version {} is immutable", self.id),
            ));
        }
        Ok(())
    }

    fn guard_transition(&self, target: ParsingStatus) -> Result<(), DomainError> {
        self.guard_mutable()?;
        self.parsing_status
            .transition_to(target)
            .map_err(|e| DomainError::new(ErrorCode::InvalidTransition, e.to_string()))?;
        Ok(())
    }

    /// The parse job picked this version up.
    pub fn mark_in_progress(mut self) -> Result<Self, DomainError> {
        self.guard_transition(ParsingStatus::InProgress)?;
        self.parsing_status = ParsingStatus::InProgress;
        Ok(self)
    }

    /// The parse job finished successfully. Becomes immutable.
    pub fn mark_completed(mut self, parsed_blob_key: impl Into<String>, content_hash: impl Into<String>) -> Result<Self, DomainError> {
        self.guard_transition(ParsingStatus::Completed)?;
        self.parsing_status = ParsingStatus::Completed;
        self.parsed_blob_key = Some(parsed_blob_key.into());
        self.content_hash = Some(content_hash.into());
        self.is_immutable = true;
        Ok(self)
    }

    /// The parse job failed. Failed versions are terminal but are not
    /// marked `is_immutable` — a fresh parse attempt is a new row.
    pub fn mark_failed(mut self, parsing_error: impl Into<String>) -> Result<Self, DomainError> {
        self.guard_transition(ParsingStatus::Failed)?;
        self.parsing_status = ParsingStatus::Failed;
        self.parsing_error = Some(parsing_error.into());
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_version() -> TemplateVersion {
        TemplateVersion::new(TemplateId::new(), 1, "templates/t1/1/source.docx")
    }

    #[test]
    fn new_version_starts_pending_and_mutable() {
        let v = new_version();
        assert_eq!(v.parsing_status, ParsingStatus::Pending);
        assert!(!v.is_immutable);
    }

    #[test]
    fn completing_sets_immutable_and_fields() {
        let v = new_version().mark_in_progress().unwrap();
        let v = v.mark_completed("templates/t1/1/parsed.json", "abc123").unwrap();
        assert_eq!(v.parsing_status, ParsingStatus::Completed);
        assert!(v.is_immutable);
        assert_eq!(v.parsed_blob_key.as_deref(), Some("templates/t1/1/parsed.json"));
        assert_eq!(v.content_hash.as_deref(), Some("abc123"));
    }

    #[test]
    fn failing_sets_error_but_not_immutable() {
        let v = new_version().mark_in_progress().unwrap();
        let v = v.mark_failed("corrupted zip").unwrap();
        assert_eq!(v.parsing_status, ParsingStatus::Failed);
        assert!(!v.is_immutable);
        assert_eq!(v.parsing_error.as_deref(), Some("corrupted zip"));
    }

    #[test]
    fn cannot_skip_pending_to_completed() {
        let v = new_version();
        let err = v.mark_completed("x", "y").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
    }

    #[test]
    fn cannot_mutate_once_immutable() {
        let v = new_version().mark_in_progress().unwrap();
        let v = v.mark_completed("k", "h").unwrap();
        let err = v.mark_failed("too late").unwrap_err();
        assert_eq!(err.code, ErrorCode::ImmutabilityViolation);
    }
}
