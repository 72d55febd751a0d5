//! Artifact Store (C1) - typed CRUD for every persisted entity in the data
//! model, plus the natural-key lookups the pipeline needs for idempotency.
//!
//! Each trait extends the generic `Repository<T, ID>` from
//! `domain::foundation::repository` with the domain-specific query methods
//! §4.1 requires. Implementations (Postgres, in-memory) are responsible for
//! the transactional read-modify-write and immutability-guard contract
//! described there; this module only states the surface.

use async_trait::async_trait;

use crate::domain::assembly::AssembledDocument;
use crate::domain::audit::{AuditLogEntry, EntityType};
use crate::domain::document::{Document, DocumentVersion};
use crate::domain::foundation::{
    AssembledDocumentId, DocumentId, DocumentVersionId, DomainError,
    GenerationInputBatchId, JobId, RenderedDocumentId, SectionOutputBatchId, TemplateId,
    TemplateVersionId,
};
use crate::domain::generation::{GenerationInputBatch, SectionOutputBatch};
use crate::domain::job::Job;
use crate::domain::rendering::RenderedDocument;
use crate::domain::template::{Section, Template, TemplateVersion};
use crate::domain::foundation::Repository;

#[async_trait]
pub trait TemplateRepository: Repository<Template, TemplateId> {
    async fn find_by_name(&self, name: &str) -> Result<Option<Template>, DomainError>;
}

#[async_trait]
pub trait TemplateVersionRepository: Repository<TemplateVersion, TemplateVersionId> {
    /// Latest version number for a template, or `0` if none exists yet.
    async fn latest_version_number(&self, template_id: TemplateId) -> Result<i32, DomainError>;
    async fn find_by_content_hash(&self, content_hash: &str) -> Result<Option<TemplateVersion>, DomainError>;
}

#[async_trait]
pub trait SectionRepository: Send + Sync {
    async fn save_all(&self, sections: &[Section]) -> Result<(), DomainError>;
    async fn find_by_template_version(
        &self,
        template_version_id: TemplateVersionId,
    ) -> Result<Vec<Section>, DomainError>;
}

#[async_trait]
pub trait DocumentRepository: Repository<Document, DocumentId> {}

#[async_trait]
pub trait DocumentVersionRepository: Repository<DocumentVersion, DocumentVersionId> {
    async fn find_by_document_and_version(
        &self,
        document_id: DocumentId,
        version_number: i32,
    ) -> Result<Option<DocumentVersion>, DomainError>;
    async fn all_version_numbers(&self, document_id: DocumentId) -> Result<Vec<i32>, DomainError>;
}

#[async_trait]
pub trait GenerationInputBatchRepository: Repository<GenerationInputBatch, GenerationInputBatchId> {
    async fn batch_by(
        &self,
        document_id: DocumentId,
        version_intent: i32,
    ) -> Result<Option<GenerationInputBatch>, DomainError>;
    async fn find_by_content_hash(&self, content_hash: &str) -> Result<Option<GenerationInputBatch>, DomainError>;
}

#[async_trait]
pub trait SectionOutputBatchRepository: Repository<SectionOutputBatch, SectionOutputBatchId> {
    async fn find_by_input_batch(
        &self,
        input_batch_id: GenerationInputBatchId,
    ) -> Result<Option<SectionOutputBatch>, DomainError>;
}

#[async_trait]
pub trait AssembledDocumentRepository: Repository<AssembledDocument, AssembledDocumentId> {
    async fn assembled_by(
        &self,
        document_id: DocumentId,
        version_intent: i32,
    ) -> Result<Option<AssembledDocument>, DomainError>;
}

#[async_trait]
pub trait RenderedDocumentRepository: Repository<RenderedDocument, RenderedDocumentId> {
    async fn rendered_by(
        &self,
        document_id: DocumentId,
        version: i32,
    ) -> Result<Option<RenderedDocument>, DomainError>;
    async fn find_by_content_hash(&self, content_hash: &str) -> Result<Option<RenderedDocument>, DomainError>;
}

#[async_trait]
pub trait JobRepository: Repository<Job, JobId> {
    /// Race-free single-assignment claim: selects the oldest pending job,
    /// row-locks it, and marks it `running` for `worker_id` in one transaction.
    async fn claim_pending(&self, worker_id: &str) -> Result<Option<Job>, DomainError>;
}

#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    async fn append(&self, entry: &AuditLogEntry) -> Result<(), DomainError>;
    async fn find_by_entity(
        &self,
        entity_type: EntityType,
        entity_id: &str,
    ) -> Result<Vec<AuditLogEntry>, DomainError>;
    async fn find_by_action(&self, action: &str) -> Result<Vec<AuditLogEntry>, DomainError>;
}
