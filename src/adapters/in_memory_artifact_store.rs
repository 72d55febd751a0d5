//! In-memory Artifact Store (C1) - implements every repository trait in
//! `ports::artifact_store` over plain `Mutex<HashMap>`s. Exists purely for
//! integration tests exercising the end-to-end scenarios against doubles,
//! per the ambient test-tooling stack; carries none of Postgres's
//! concurrency semantics beyond a single process-wide lock per table.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::assembly::AssembledDocument;
use crate::domain::audit::{AuditLogEntry, EntityType};
use crate::domain::document::{Document, DocumentVersion};
use crate::domain::foundation::{
    AssembledDocumentId, DocumentId, DocumentVersionId, DomainError, ErrorCode,
    GenerationInputBatchId, JobId, Repository, RenderedDocumentId, SectionId,
    SectionOutputBatchId, TemplateId, TemplateVersionId,
};
use crate::domain::generation::{GenerationInputBatch, SectionOutputBatch};
use crate::domain::job::Job;
use crate::domain::rendering::RenderedDocument;
use crate::domain::template::{Section, Template, TemplateVersion};
use crate::ports::{
    AssembledDocumentRepository, AuditLogRepository, DocumentRepository,
    DocumentVersionRepository, GenerationInputBatchRepository, JobRepository,
    RenderedDocumentRepository, SectionOutputBatchRepository, SectionRepository,
    TemplateRepository, TemplateVersionRepository,
};

fn not_found(what: &str) -> DomainError {
    DomainError::new(ErrorCode::NotFound, format!("{what} not found"))
}

fn immutable(what: &str) -> DomainError {
    DomainError::new(ErrorCode::ImmutabilityViolation, format!("{what} is immutable"))
}

#[derive(Default)]
pub struct InMemoryTemplateRepository {
    data: Mutex<HashMap<TemplateId, Template>>,
}

impl InMemoryTemplateRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository<Template, TemplateId> for InMemoryTemplateRepository {
    async fn find_by_id(&self, id: TemplateId) -> Result<Option<Template>, DomainError> {
        Ok(self.data.lock().unwrap().get(&id).cloned())
    }

    async fn save(&self, entity: &Template) -> Result<(), DomainError> {
        self.data.lock().unwrap().insert(entity.id, entity.clone());
        Ok(())
    }

    async fn update(&self, entity: &Template) -> Result<(), DomainError> {
        let mut data = self.data.lock().unwrap();
        if !data.contains_key(&entity.id) {
            return Err(not_found("template"));
        }
        data.insert(entity.id, entity.clone());
        Ok(())
    }

    async fn delete(&self, id: TemplateId) -> Result<(), DomainError> {
        self.data.lock().unwrap().remove(&id).map(|_| ()).ok_or_else(|| not_found("template"))
    }
}

#[async_trait]
impl TemplateRepository for InMemoryTemplateRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<Template>, DomainError> {
        Ok(self.data.lock().unwrap().values().find(|t| t.name == name).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryTemplateVersionRepository {
    data: Mutex<HashMap<TemplateVersionId, TemplateVersion>>,
}

impl InMemoryTemplateVersionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository<TemplateVersion, TemplateVersionId> for InMemoryTemplateVersionRepository {
    async fn find_by_id(&self, id: TemplateVersionId) -> Result<Option<TemplateVersion>, DomainError> {
        Ok(self.data.lock().unwrap().get(&id).cloned())
    }

    async fn save(&self, entity: &TemplateVersion) -> Result<(), DomainError> {
        self.data.lock().unwrap().insert(entity.id, entity.clone());
        Ok(())
    }

    async fn update(&self, entity: &TemplateVersion) -> Result<(), DomainError> {
        let mut data = self.data.lock().unwrap();
        match data.get(&entity.id) {
            None => return Err(not_found("template version")),
            Some(current) if current.is_immutable => return Err(immutable("template version")),
            _ => {}
        }
        data.insert(entity.id, entity.clone());
        Ok(())
    }

    async fn delete(&self, _id: TemplateVersionId) -> Result<(), DomainError> {
        Err(immutable("template versions are never deleted"))
    }
}

#[async_trait]
impl TemplateVersionRepository for InMemoryTemplateVersionRepository {
    async fn latest_version_number(&self, template_id: TemplateId) -> Result<i32, DomainError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .values()
            .filter(|v| v.template_id == template_id)
            .map(|v| v.version_number)
            .max()
            .unwrap_or(0))
    }

    async fn find_by_content_hash(&self, content_hash: &str) -> Result<Option<TemplateVersion>, DomainError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .values()
            .find(|v| v.content_hash.as_deref() == Some(content_hash))
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemorySectionRepository {
    data: Mutex<HashMap<(TemplateVersionId, SectionId), Section>>,
}

impl InMemorySectionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SectionRepository for InMemorySectionRepository {
    async fn save_all(&self, sections: &[Section]) -> Result<(), DomainError> {
        let mut data = self.data.lock().unwrap();
        for section in sections {
            data.insert((section.template_version_id, section.id), section.clone());
        }
        Ok(())
    }

    async fn find_by_template_version(&self, template_version_id: TemplateVersionId) -> Result<Vec<Section>, DomainError> {
        let mut sections: Vec<Section> = self
            .data
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.template_version_id == template_version_id)
            .cloned()
            .collect();
        sections.sort_by_key(|s| s.sequence_order);
        Ok(sections)
    }
}

#[derive(Default)]
pub struct InMemoryDocumentRepository {
    data: Mutex<HashMap<DocumentId, Document>>,
}

impl InMemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository<Document, DocumentId> for InMemoryDocumentRepository {
    async fn find_by_id(&self, id: DocumentId) -> Result<Option<Document>, DomainError> {
        Ok(self.data.lock().unwrap().get(&id).cloned())
    }

    async fn save(&self, entity: &Document) -> Result<(), DomainError> {
        self.data.lock().unwrap().insert(entity.id, entity.clone());
        Ok(())
    }

    async fn update(&self, entity: &Document) -> Result<(), DomainError> {
        let mut data = self.data.lock().unwrap();
        if !data.contains_key(&entity.id) {
            return Err(not_found("document"));
        }
        data.insert(entity.id, entity.clone());
        Ok(())
    }

    async fn delete(&self, id: DocumentId) -> Result<(), DomainError> {
        self.data.lock().unwrap().remove(&id).map(|_| ()).ok_or_else(|| not_found("document"))
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {}

#[derive(Default)]
pub struct InMemoryDocumentVersionRepository {
    data: Mutex<HashMap<DocumentVersionId, DocumentVersion>>,
}

impl InMemoryDocumentVersionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository<DocumentVersion, DocumentVersionId> for InMemoryDocumentVersionRepository {
    async fn find_by_id(&self, id: DocumentVersionId) -> Result<Option<DocumentVersion>, DomainError> {
        Ok(self.data.lock().unwrap().get(&id).cloned())
    }

    async fn save(&self, entity: &DocumentVersion) -> Result<(), DomainError> {
        self.data.lock().unwrap().insert(entity.id, entity.clone());
        Ok(())
    }

    async fn update(&self, _entity: &DocumentVersion) -> Result<(), DomainError> {
        Err(immutable("document versions are never updated"))
    }

    async fn delete(&self, _id: DocumentVersionId) -> Result<(), DomainError> {
        Err(immutable("document versions are never deleted"))
    }
}

#[async_trait]
impl DocumentVersionRepository for InMemoryDocumentVersionRepository {
    async fn find_by_document_and_version(&self, document_id: DocumentId, version_number: i32) -> Result<Option<DocumentVersion>, DomainError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .values()
            .find(|v| v.document_id == document_id && v.version_number == version_number)
            .cloned())
    }

    async fn all_version_numbers(&self, document_id: DocumentId) -> Result<Vec<i32>, DomainError> {
        let mut versions: Vec<i32> = self
            .data
            .lock()
            .unwrap()
            .values()
            .filter(|v| v.document_id == document_id)
            .map(|v| v.version_number)
            .collect();
        versions.sort_unstable();
        Ok(versions)
    }
}

#[derive(Default)]
pub struct InMemoryGenerationInputBatchRepository {
    data: Mutex<HashMap<GenerationInputBatchId, GenerationInputBatch>>,
}

impl InMemoryGenerationInputBatchRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository<GenerationInputBatch, GenerationInputBatchId> for InMemoryGenerationInputBatchRepository {
    async fn find_by_id(&self, id: GenerationInputBatchId) -> Result<Option<GenerationInputBatch>, DomainError> {
        Ok(self.data.lock().unwrap().get(&id).cloned())
    }

    async fn save(&self, entity: &GenerationInputBatch) -> Result<(), DomainError> {
        self.data.lock().unwrap().insert(entity.id, entity.clone());
        Ok(())
    }

    async fn update(&self, entity: &GenerationInputBatch) -> Result<(), DomainError> {
        let mut data = self.data.lock().unwrap();
        match data.get(&entity.id) {
            None => return Err(not_found("generation input batch")),
            Some(current) if current.is_immutable => return Err(immutable("generation input batch")),
            _ => {}
        }
        data.insert(entity.id, entity.clone());
        Ok(())
    }

    async fn delete(&self, _id: GenerationInputBatchId) -> Result<(), DomainError> {
        Err(immutable("generation input batches are never deleted"))
    }
}

#[async_trait]
impl GenerationInputBatchRepository for InMemoryGenerationInputBatchRepository {
    async fn batch_by(&self, document_id: DocumentId, version_intent: i32) -> Result<Option<GenerationInputBatch>, DomainError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .values()
            .find(|b| b.document_id == document_id && b.version_intent == version_intent)
            .cloned())
    }

    async fn find_by_content_hash(&self, content_hash: &str) -> Result<Option<GenerationInputBatch>, DomainError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .values()
            .find(|b| b.content_hash.as_deref() == Some(content_hash))
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemorySectionOutputBatchRepository {
    data: Mutex<HashMap<SectionOutputBatchId, SectionOutputBatch>>,
}

impl InMemorySectionOutputBatchRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository<SectionOutputBatch, SectionOutputBatchId> for InMemorySectionOutputBatchRepository {
    async fn find_by_id(&self, id: SectionOutputBatchId) -> Result<Option<SectionOutputBatch>, DomainError> {
        Ok(self.data.lock().unwrap().get(&id).cloned())
    }

    async fn save(&self, entity: &SectionOutputBatch) -> Result<(), DomainError> {
        self.data.lock().unwrap().insert(entity.id, entity.clone());
        Ok(())
    }

    async fn update(&self, entity: &SectionOutputBatch) -> Result<(), DomainError> {
        let mut data = self.data.lock().unwrap();
        match data.get(&entity.id) {
            None => return Err(not_found("section output batch")),
            Some(current) if current.is_immutable => return Err(immutable("section output batch")),
            _ => {}
        }
        data.insert(entity.id, entity.clone());
        Ok(())
    }

    async fn delete(&self, _id: SectionOutputBatchId) -> Result<(), DomainError> {
        Err(immutable("section output batches are never deleted"))
    }
}

#[async_trait]
impl SectionOutputBatchRepository for InMemorySectionOutputBatchRepository {
    async fn find_by_input_batch(&self, input_batch_id: GenerationInputBatchId) -> Result<Option<SectionOutputBatch>, DomainError> {
        Ok(self.data.lock().unwrap().values().find(|b| b.input_batch_id == input_batch_id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryAssembledDocumentRepository {
    data: Mutex<HashMap<AssembledDocumentId, AssembledDocument>>,
}

impl InMemoryAssembledDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository<AssembledDocument, AssembledDocumentId> for InMemoryAssembledDocumentRepository {
    async fn find_by_id(&self, id: AssembledDocumentId) -> Result<Option<AssembledDocument>, DomainError> {
        Ok(self.data.lock().unwrap().get(&id).cloned())
    }

    async fn save(&self, entity: &AssembledDocument) -> Result<(), DomainError> {
        self.data.lock().unwrap().insert(entity.id, entity.clone());
        Ok(())
    }

    async fn update(&self, entity: &AssembledDocument) -> Result<(), DomainError> {
        let mut data = self.data.lock().unwrap();
        match data.get(&entity.id) {
            None => return Err(not_found("assembled document")),
            Some(current) if current.is_immutable => return Err(immutable("assembled document")),
            _ => {}
        }
        data.insert(entity.id, entity.clone());
        Ok(())
    }

    async fn delete(&self, _id: AssembledDocumentId) -> Result<(), DomainError> {
        Err(immutable("assembled documents are never deleted"))
    }
}

#[async_trait]
impl AssembledDocumentRepository for InMemoryAssembledDocumentRepository {
    async fn assembled_by(&self, document_id: DocumentId, version_intent: i32) -> Result<Option<AssembledDocument>, DomainError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .values()
            .find(|a| a.document_id == document_id && a.version_intent == version_intent)
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryRenderedDocumentRepository {
    data: Mutex<HashMap<RenderedDocumentId, RenderedDocument>>,
}

impl InMemoryRenderedDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository<RenderedDocument, RenderedDocumentId> for InMemoryRenderedDocumentRepository {
    async fn find_by_id(&self, id: RenderedDocumentId) -> Result<Option<RenderedDocument>, DomainError> {
        Ok(self.data.lock().unwrap().get(&id).cloned())
    }

    async fn save(&self, entity: &RenderedDocument) -> Result<(), DomainError> {
        self.data.lock().unwrap().insert(entity.id, entity.clone());
        Ok(())
    }

    async fn update(&self, entity: &RenderedDocument) -> Result<(), DomainError> {
        let mut data = self.data.lock().unwrap();
        match data.get(&entity.id) {
            None => return Err(not_found("rendered document")),
            Some(current) if current.is_immutable => return Err(immutable("rendered document")),
            _ => {}
        }
        data.insert(entity.id, entity.clone());
        Ok(())
    }

    async fn delete(&self, _id: RenderedDocumentId) -> Result<(), DomainError> {
        Err(immutable("rendered documents are never deleted"))
    }
}

#[async_trait]
impl RenderedDocumentRepository for InMemoryRenderedDocumentRepository {
    async fn rendered_by(&self, document_id: DocumentId, version: i32) -> Result<Option<RenderedDocument>, DomainError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .values()
            .find(|r| r.document_id == document_id && r.version == version)
            .cloned())
    }

    async fn find_by_content_hash(&self, content_hash: &str) -> Result<Option<RenderedDocument>, DomainError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .values()
            .find(|r| r.content_hash.as_deref() == Some(content_hash))
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryJobRepository {
    data: Mutex<HashMap<JobId, Job>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository<Job, JobId> for InMemoryJobRepository {
    async fn find_by_id(&self, id: JobId) -> Result<Option<Job>, DomainError> {
        Ok(self.data.lock().unwrap().get(&id).cloned())
    }

    async fn save(&self, entity: &Job) -> Result<(), DomainError> {
        self.data.lock().unwrap().insert(entity.id, entity.clone());
        Ok(())
    }

    async fn update(&self, entity: &Job) -> Result<(), DomainError> {
        let mut data = self.data.lock().unwrap();
        if !data.contains_key(&entity.id) {
            return Err(not_found("job"));
        }
        data.insert(entity.id, entity.clone());
        Ok(())
    }

    async fn delete(&self, id: JobId) -> Result<(), DomainError> {
        self.data.lock().unwrap().remove(&id).map(|_| ()).ok_or_else(|| not_found("job"))
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn claim_pending(&self, worker_id: &str) -> Result<Option<Job>, DomainError> {
        let mut data = self.data.lock().unwrap();
        let oldest_pending = data
            .values()
            .filter(|j| j.status == crate::domain::job::JobStatus::Pending)
            .min_by_key(|j| j.created_at.as_unix_secs())
            .cloned();
        let Some(job) = oldest_pending else {
            return Ok(None);
        };
        let claimed = job.claim(worker_id).map_err(|e| DomainError::new(ErrorCode::InvalidTransition, e.to_string()))?;
        data.insert(claimed.id, claimed.clone());
        Ok(Some(claimed))
    }
}

#[derive(Default)]
pub struct InMemoryAuditLogRepository {
    entries: Mutex<Vec<AuditLogEntry>>,
}

impl InMemoryAuditLogRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAuditLogRepository {
    async fn append(&self, entry: &AuditLogEntry) -> Result<(), DomainError> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn find_by_entity(&self, entity_type: EntityType, entity_id: &str) -> Result<Vec<AuditLogEntry>, DomainError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.entity_type == entity_type && e.entity_id == entity_id)
            .cloned()
            .collect())
    }

    async fn find_by_action(&self, action: &str) -> Result<Vec<AuditLogEntry>, DomainError> {
        Ok(self.entries.lock().unwrap().iter().filter(|e| e.action == action).cloned().collect())
    }
}
