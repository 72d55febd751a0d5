//! Demo Seeder (C11, §4.11/§6) — populates the Artifact Store and Object
//! Store with the fixed-id fixtures backing the `/demo/*` HTTP endpoints:
//! one template, one completed template version, five sections (two
//! static, three dynamic), and one document. Re-running `seed()` is safe —
//! every write is idempotent by reuse, the same way the Pipeline
//! Coordinator treats its own stages.

use std::sync::Arc;

use serde_json::json;

use crate::domain::demo::{DEMO_DOCUMENT_ID, DEMO_SECTION_IDS, DEMO_TEMPLATE_ID, DEMO_TEMPLATE_VERSION_ID};
use crate::domain::document::Document;
use crate::domain::foundation::{sha256_hex_canonical_json, DomainError, ErrorCode, Repository, Timestamp};
use crate::domain::template::{Block, BlockType, ParsedDocument, Section, Template, TemplateVersion};
use crate::ports::{keys, DocumentRepository, ObjectStore, SectionRepository, TemplateRepository, TemplateVersionRepository};

/// A snapshot of the fixed demo ids, returned by `GET /demo/ids`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DemoIds {
    pub template_id: String,
    pub template_version_id: String,
    pub document_id: String,
    pub section_ids: Vec<String>,
}

pub struct DemoSeeder {
    pub templates: Arc<dyn TemplateRepository>,
    pub template_versions: Arc<dyn TemplateVersionRepository>,
    pub sections: Arc<dyn SectionRepository>,
    pub documents: Arc<dyn DocumentRepository>,
    pub object_store: Arc<dyn ObjectStore>,
}

fn fixture_blocks() -> Vec<Block> {
    vec![
        Block::new("body/0", 0, BlockType::Heading { level: 1, text: "Demo Engagement Letter".into() }),
        Block::new("body/1", 1, BlockType::Paragraph { text: "{{introduction}}".into() }),
        Block::new("body/2", 2, BlockType::Paragraph { text: "{{scope_of_work}}".into() }),
        Block::new("body/3", 3, BlockType::Paragraph { text: "{{fee_schedule}}".into() }),
        Block::new("body/4", 4, BlockType::Paragraph { text: "Sincerely, the firm.".into() }),
    ]
}

impl DemoSeeder {
    /// Writes the fixed demo fixtures, or returns the existing ones if
    /// `seed()` already ran — keyed off the template version's id.
    pub async fn seed(&self) -> Result<(), DomainError> {
        if let Some(existing) = self.template_versions.find_by_id(*DEMO_TEMPLATE_VERSION_ID).await? {
            if existing.is_immutable {
                return Ok(());
            }
        }

        let template = Template::from_parts(*DEMO_TEMPLATE_ID, "Demo Engagement Letter".to_string(), Timestamp::now());
        self.templates.save(&template).await?;

        let source_key = keys::template_source(&DEMO_TEMPLATE_ID.to_string(), 1);
        self.object_store
            .put(&source_key, b"demo fixture, never actually parsed from a .docx")
            .await
            .map_err(|e| DomainError::new(ErrorCode::PersistenceFailed, e.to_string()))?;

        let mut version = TemplateVersion::new(*DEMO_TEMPLATE_ID, 1, source_key);
        version.id = *DEMO_TEMPLATE_VERSION_ID;
        let version = version.mark_in_progress()?;

        let blocks = fixture_blocks();
        let content_hash = sha256_hex_canonical_json(&blocks).map_err(|e| DomainError::new(ErrorCode::InternalError, e.to_string()))?;
        let parsed = ParsedDocument::new(content_hash.clone(), blocks, Vec::new(), Vec::new());
        let parsed_bytes = serde_json::to_vec(&parsed).map_err(|e| DomainError::new(ErrorCode::InternalError, e.to_string()))?;
        let parsed_key = keys::template_parsed(&DEMO_TEMPLATE_ID.to_string(), 1);
        self.object_store
            .put(&parsed_key, &parsed_bytes)
            .await
            .map_err(|e| DomainError::new(ErrorCode::PersistenceFailed, e.to_string()))?;

        let version = version.mark_completed(parsed_key, content_hash)?;
        self.template_versions.save(&version).await?;

        let section_at = |index: usize| DEMO_SECTION_IDS[index];
        let sections = vec![
            Section::new_static(section_at(0), *DEMO_TEMPLATE_VERSION_ID, "body/0", 0).freeze()?,
            Section::new_dynamic(section_at(1), *DEMO_TEMPLATE_VERSION_ID, "body/1", 1, json!({"kind": "introduction"})).freeze()?,
            Section::new_dynamic(section_at(2), *DEMO_TEMPLATE_VERSION_ID, "body/2", 2, json!({"kind": "scope_of_work"})).freeze()?,
            Section::new_dynamic(section_at(3), *DEMO_TEMPLATE_VERSION_ID, "body/3", 3, json!({"kind": "fee_schedule"})).freeze()?,
            Section::new_static(section_at(4), *DEMO_TEMPLATE_VERSION_ID, "body/4", 4).freeze()?,
        ];
        self.sections.save_all(&sections).await?;

        let document = Document { id: *DEMO_DOCUMENT_ID, template_version_id: *DEMO_TEMPLATE_VERSION_ID, current_version: 0 };
        self.documents.save(&document).await?;

        Ok(())
    }

    pub fn ids(&self) -> DemoIds {
        DemoIds {
            template_id: DEMO_TEMPLATE_ID.to_string(),
            template_version_id: DEMO_TEMPLATE_VERSION_ID.to_string(),
            document_id: DEMO_DOCUMENT_ID.to_string(),
            section_ids: DEMO_SECTION_IDS.iter().map(ToString::to_string).collect(),
        }
    }

    /// Checks that the seeded fixtures are internally consistent: the
    /// template version is completed and immutable, and it owns exactly
    /// the five fixed sections. Backs `POST /demo/validate`.
    pub async fn validate(&self) -> Result<(), DomainError> {
        let version = self
            .template_versions
            .find_by_id(*DEMO_TEMPLATE_VERSION_ID)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::NotFound, "demo template version has not been seeded"))?;
        if !version.is_immutable {
            return Err(DomainError::new(ErrorCode::ValidationFailed, "demo template version is not immutable"));
        }

        let sections = self.sections.find_by_template_version(*DEMO_TEMPLATE_VERSION_ID).await?;
        if sections.len() != DEMO_SECTION_IDS.len() {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                format!("expected {} demo sections, found {}", DEMO_SECTION_IDS.len(), sections.len()),
            ));
        }
        if sections.iter().any(|s| !s.is_immutable) {
            return Err(DomainError::new(ErrorCode::ValidationFailed, "a demo section is not immutable"));
        }

        let document = self
            .documents
            .find_by_id(*DEMO_DOCUMENT_ID)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::NotFound, "demo document has not been seeded"))?;
        if document.template_version_id != *DEMO_TEMPLATE_VERSION_ID {
            return Err(DomainError::new(ErrorCode::ValidationFailed, "demo document points at the wrong template version"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{
        InMemoryDocumentRepository, InMemoryObjectStore, InMemorySectionRepository, InMemoryTemplateRepository,
        InMemoryTemplateVersionRepository,
    };

    fn seeder() -> DemoSeeder {
        DemoSeeder {
            templates: Arc::new(InMemoryTemplateRepository::new()),
            template_versions: Arc::new(InMemoryTemplateVersionRepository::new()),
            sections: Arc::new(InMemorySectionRepository::new()),
            documents: Arc::new(InMemoryDocumentRepository::new()),
            object_store: Arc::new(InMemoryObjectStore::new()),
        }
    }

    #[tokio::test]
    async fn seeding_then_validating_succeeds() {
        let seeder = seeder();
        seeder.seed().await.unwrap();
        seeder.validate().await.unwrap();
    }

    #[tokio::test]
    async fn validating_before_seeding_fails() {
        let seeder = seeder();
        assert!(seeder.validate().await.is_err());
    }

    #[tokio::test]
    async fn seeding_twice_is_idempotent() {
        let seeder = seeder();
        seeder.seed().await.unwrap();
        seeder.seed().await.unwrap();
        let sections = seeder.sections.find_by_template_version(*DEMO_TEMPLATE_VERSION_ID).await.unwrap();
        assert_eq!(sections.len(), DEMO_SECTION_IDS.len());
    }

    #[test]
    fn ids_reports_five_sections() {
        let ids = seeder().ids();
        assert_eq!(ids.section_ids.len(), 5);
    }
}
