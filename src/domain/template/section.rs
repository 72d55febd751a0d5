//! `Section` entity — a logical block in a `TemplateVersion`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{DomainError, ErrorCode, SectionId, TemplateVersionId};

/// Whether a section's content is fixed by the template or filled by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    Static,
    Dynamic,
}

/// A logical block in a `TemplateVersion`, produced by the classify job.
///
/// Immutable once the owning version's classification completes — this is
/// enforced by the classify job setting `is_immutable=true` on every section
/// atomically with the version's own transition, not by a per-section state
/// machine (a `Section` has no independent lifecycle).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub template_version_id: TemplateVersionId,
    pub structural_path: String,
    pub section_type: SectionType,
    pub prompt_config: Option<Value>,
    pub sequence_order: i32,
    pub is_immutable: bool,
}

impl Section {
    /// Creates a static section (verbatim, never regenerated).
    pub fn new_static(id: SectionId, template_version_id: TemplateVersionId, structural_path: impl Into<String>, sequence_order: i32) -> Self {
        Self {
            id,
            template_version_id,
            structural_path: structural_path.into(),
            section_type: SectionType::Static,
            prompt_config: None,
            sequence_order,
            is_immutable: false,
        }
    }

    /// Creates a dynamic section (filled by the model per generation).
    pub fn new_dynamic(
        id: SectionId,
        template_version_id: TemplateVersionId,
        structural_path: impl Into<String>,
        sequence_order: i32,
        prompt_config: Value,
    ) -> Self {
        Self {
            id,
            template_version_id,
            structural_path: structural_path.into(),
            section_type: SectionType::Dynamic,
            prompt_config: Some(prompt_config),
            sequence_order,
            is_immutable: false,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        self.section_type == SectionType::Dynamic
    }

    pub fn is_static(&self) -> bool {
        self.section_type == SectionType::Static
    }

    /// Called atomically by the classify job when the owning template
    /// version's classification completes.
    pub fn freeze(mut self) -> Result<Self, DomainError> {
        if self.is_immutable {
            return Err(DomainError::new(
                ErrorCode::ImmutabilityViolation,
                format!("section {} is already immutable", self.id),
            ));
        }
        self.is_immutable = true;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dynamic_section_carries_prompt_config() {
        let s = Section::new_dynamic(
            SectionId::new(1),
            TemplateVersionId::new(),
            "body/introduction",
            1,
            json!({"tone": "formal"}),
        );
        assert!(s.is_dynamic());
        assert!(s.prompt_config.is_some());
    }

    #[test]
    fn static_section_has_no_prompt_config() {
        let s = Section::new_static(SectionId::new(2), TemplateVersionId::new(), "body/signature", 2);
        assert!(s.is_static());
        assert!(s.prompt_config.is_none());
    }

    #[test]
    fn freeze_sets_immutable_once() {
        let s = Section::new_static(SectionId::new(3), TemplateVersionId::new(), "x", 0);
        let s = s.freeze().unwrap();
        assert!(s.is_immutable);
        let err = s.freeze().unwrap_err();
        assert_eq!(err.code, ErrorCode::ImmutabilityViolation);
    }
}
