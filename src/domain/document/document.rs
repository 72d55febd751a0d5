//! `Document` entity — a generation target bound to one `TemplateVersion`.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DocumentId, TemplateVersionId};

/// A generation target. Carries no lifecycle of its own beyond
/// `current_version`, which the Pipeline Coordinator advances on each
/// successful run; all real state lives on its `DocumentVersion`s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub template_version_id: TemplateVersionId,
    pub current_version: i32,
}

impl Document {
    pub fn new(template_version_id: TemplateVersionId) -> Self {
        Self {
            id: DocumentId::new(),
            template_version_id,
            current_version: 0,
        }
    }

    /// The version number a fresh pipeline run should intend to produce.
    pub fn next_version_intent(&self) -> i32 {
        self.current_version + 1
    }

    /// Called once the pipeline's versioning stage creates a `DocumentVersion`.
    pub fn advance_to(mut self, version_number: i32) -> Self {
        self.current_version = version_number;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_starts_at_version_zero() {
        let doc = Document::new(TemplateVersionId::new());
        assert_eq!(doc.current_version, 0);
        assert_eq!(doc.next_version_intent(), 1);
    }

    #[test]
    fn advancing_updates_current_version() {
        let doc = Document::new(TemplateVersionId::new()).advance_to(1);
        assert_eq!(doc.current_version, 1);
        assert_eq!(doc.next_version_intent(), 2);
    }
}
