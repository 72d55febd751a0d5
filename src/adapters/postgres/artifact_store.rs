//! PostgreSQL Artifact Store (C1, §4.1).
//!
//! Every entity is persisted as a row carrying its full serialized form in a
//! `data JSONB` column plus the handful of indexed columns its natural-key
//! lookups need — the same envelope the teacher uses for `Cycle` components
//! (`cycle_repository.rs`), generalized from one aggregate to eleven. Each
//! repository guards the immutability contract from §4.1 itself: `update`
//! reloads the row inside the same transaction and refuses to proceed if
//! `is_immutable` was already set, since the in-JSONB flag is the only source
//! of truth for that invariant.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::assembly::AssembledDocument;
use crate::domain::audit::{AuditLogEntry, EntityType};
use crate::domain::document::{Document, DocumentVersion};
use crate::domain::foundation::{
    AssembledDocumentId, DocumentId, DocumentVersionId, DomainError, ErrorCode,
    GenerationInputBatchId, JobId, RenderedDocumentId, Repository, SectionId,
    SectionOutputBatchId, TemplateId, TemplateVersionId,
};
use crate::domain::generation::{GenerationInputBatch, SectionOutputBatch};
use crate::domain::job::{Job, JobStatus};
use crate::domain::rendering::RenderedDocument;
use crate::domain::template::{Section, Template, TemplateVersion};
use crate::ports::{
    AssembledDocumentRepository, AuditLogRepository, DocumentRepository,
    DocumentVersionRepository, GenerationInputBatchRepository, JobRepository,
    RenderedDocumentRepository, SectionOutputBatchRepository, SectionRepository,
    TemplateRepository, TemplateVersionRepository,
};

fn db_err(e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("database error: {e}"))
}

fn json_err(e: serde_json::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("failed to (de)serialize row: {e}"))
}

async fn fetch_one<T: DeserializeOwned>(pool: &PgPool, sql: &str, id: Uuid) -> Result<Option<T>, DomainError> {
    let row = sqlx::query(sql).bind(id).fetch_optional(pool).await.map_err(db_err)?;
    row.map(|r| {
        let value: serde_json::Value = r.try_get("data").map_err(db_err)?;
        serde_json::from_value(value).map_err(json_err)
    })
    .transpose()
}

fn to_json<T: Serialize>(entity: &T) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(entity).map_err(json_err)
}

/// `TemplateRepository` backed by a `templates(id, name, data)` table.
#[derive(Clone)]
pub struct PostgresTemplateRepository {
    pool: PgPool,
}

impl PostgresTemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<Template, TemplateId> for PostgresTemplateRepository {
    async fn find_by_id(&self, id: TemplateId) -> Result<Option<Template>, DomainError> {
        fetch_one(&self.pool, "SELECT data FROM templates WHERE id = $1", id.as_uuid()).await
    }

    async fn save(&self, entity: &Template) -> Result<(), DomainError> {
        sqlx::query("INSERT INTO templates (id, name, data) VALUES ($1, $2, $3)")
            .bind(entity.id.as_uuid())
            .bind(&entity.name)
            .bind(to_json(entity)?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn update(&self, entity: &Template) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE templates SET name = $2, data = $3 WHERE id = $1")
            .bind(entity.id.as_uuid())
            .bind(&entity.name)
            .bind(to_json(entity)?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::new(ErrorCode::NotFound, format!("template {} not found", entity.id)));
        }
        Ok(())
    }

    async fn delete(&self, id: TemplateId) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM templates WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::new(ErrorCode::NotFound, format!("template {id} not found")));
        }
        Ok(())
    }
}

#[async_trait]
impl TemplateRepository for PostgresTemplateRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<Template>, DomainError> {
        let row = sqlx::query("SELECT data FROM templates WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(|r| {
            let value: serde_json::Value = r.try_get("data").map_err(db_err)?;
            serde_json::from_value(value).map_err(json_err)
        })
        .transpose()
    }
}

/// `TemplateVersionRepository` backed by `template_versions(id, template_id, version_number, content_hash, data)`.
#[derive(Clone)]
pub struct PostgresTemplateVersionRepository {
    pool: PgPool,
}

impl PostgresTemplateVersionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<TemplateVersion, TemplateVersionId> for PostgresTemplateVersionRepository {
    async fn find_by_id(&self, id: TemplateVersionId) -> Result<Option<TemplateVersion>, DomainError> {
        fetch_one(&self.pool, "SELECT data FROM template_versions WHERE id = $1", id.as_uuid()).await
    }

    async fn save(&self, entity: &TemplateVersion) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO template_versions (id, template_id, version_number, content_hash, data) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(entity.id.as_uuid())
        .bind(entity.template_id.as_uuid())
        .bind(entity.version_number)
        .bind(&entity.content_hash)
        .bind(to_json(entity)?)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn update(&self, entity: &TemplateVersion) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let row = sqlx::query("SELECT data FROM template_versions WHERE id = $1 FOR UPDATE")
            .bind(entity.id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::new(ErrorCode::NotFound, format!("template version {} not found", entity.id)))?;
        let current: TemplateVersion = serde_json::from_value(row.try_get::<serde_json::Value, _>("data").map_err(db_err)?).map_err(json_err)?;
        if current.is_immutable {
            return Err(DomainError::new(ErrorCode::ImmutabilityViolation, format!("template version {} is immutable", entity.id)));
        }
        sqlx::query("UPDATE template_versions SET content_hash = $2, data = $3 WHERE id = $1")
            .bind(entity.id.as_uuid())
            .bind(&entity.content_hash)
            .bind(to_json(entity)?)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn delete(&self, _id: TemplateVersionId) -> Result<(), DomainError> {
        Err(DomainError::new(ErrorCode::ImmutabilityViolation, "template versions are never deleted"))
    }
}

#[async_trait]
impl TemplateVersionRepository for PostgresTemplateVersionRepository {
    async fn latest_version_number(&self, template_id: TemplateId) -> Result<i32, DomainError> {
        let row = sqlx::query("SELECT COALESCE(MAX(version_number), 0) AS max_version FROM template_versions WHERE template_id = $1")
            .bind(template_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        row.try_get::<i32, _>("max_version").map_err(db_err)
    }

    async fn find_by_content_hash(&self, content_hash: &str) -> Result<Option<TemplateVersion>, DomainError> {
        let row = sqlx::query("SELECT data FROM template_versions WHERE content_hash = $1")
            .bind(content_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(|r| {
            let value: serde_json::Value = r.try_get("data").map_err(db_err)?;
            serde_json::from_value(value).map_err(json_err)
        })
        .transpose()
    }
}

/// `SectionRepository` backed by `sections(template_version_id, section_id, data)`,
/// keyed on the composite natural key since `Section` has no standalone UUID id.
#[derive(Clone)]
pub struct PostgresSectionRepository {
    pool: PgPool,
}

impl PostgresSectionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SectionRepository for PostgresSectionRepository {
    async fn save_all(&self, sections: &[Section]) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        for section in sections {
            sqlx::query(
                "INSERT INTO sections (template_version_id, section_id, data) VALUES ($1, $2, $3)
                 ON CONFLICT (template_version_id, section_id) DO NOTHING",
            )
            .bind(section.template_version_id.as_uuid())
            .bind(section.id.value())
            .bind(to_json(section)?)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn find_by_template_version(&self, template_version_id: TemplateVersionId) -> Result<Vec<Section>, DomainError> {
        let rows = sqlx::query("SELECT data FROM sections WHERE template_version_id = $1 ORDER BY section_id")
            .bind(template_version_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.into_iter()
            .map(|r| {
                let value: serde_json::Value = r.try_get("data").map_err(db_err)?;
                serde_json::from_value(value).map_err(json_err)
            })
            .collect()
    }
}

/// `DocumentRepository` backed by `documents(id, data)`.
#[derive(Clone)]
pub struct PostgresDocumentRepository {
    pool: PgPool,
}

impl PostgresDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<Document, DocumentId> for PostgresDocumentRepository {
    async fn find_by_id(&self, id: DocumentId) -> Result<Option<Document>, DomainError> {
        fetch_one(&self.pool, "SELECT data FROM documents WHERE id = $1", id.as_uuid()).await
    }

    async fn save(&self, entity: &Document) -> Result<(), DomainError> {
        sqlx::query("INSERT INTO documents (id, data) VALUES ($1, $2)")
            .bind(entity.id.as_uuid())
            .bind(to_json(entity)?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn update(&self, entity: &Document) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE documents SET data = $2 WHERE id = $1")
            .bind(entity.id.as_uuid())
            .bind(to_json(entity)?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::new(ErrorCode::NotFound, format!("document {} not found", entity.id)));
        }
        Ok(())
    }

    async fn delete(&self, id: DocumentId) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::new(ErrorCode::NotFound, format!("document {id} not found")));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentRepository for PostgresDocumentRepository {}

/// `DocumentVersionRepository` backed by `document_versions(id, document_id, version_number, data)`.
#[derive(Clone)]
pub struct PostgresDocumentVersionRepository {
    pool: PgPool,
}

impl PostgresDocumentVersionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<DocumentVersion, DocumentVersionId> for PostgresDocumentVersionRepository {
    async fn find_by_id(&self, id: DocumentVersionId) -> Result<Option<DocumentVersion>, DomainError> {
        fetch_one(&self.pool, "SELECT data FROM document_versions WHERE id = $1", id.as_uuid()).await
    }

    async fn save(&self, entity: &DocumentVersion) -> Result<(), DomainError> {
        sqlx::query("INSERT INTO document_versions (id, document_id, version_number, data) VALUES ($1, $2, $3, $4)")
            .bind(entity.id.as_uuid())
            .bind(entity.document_id.as_uuid())
            .bind(entity.version_number)
            .bind(to_json(entity)?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn update(&self, _entity: &DocumentVersion) -> Result<(), DomainError> {
        Err(DomainError::new(ErrorCode::ImmutabilityViolation, "document versions are never updated"))
    }

    async fn delete(&self, _id: DocumentVersionId) -> Result<(), DomainError> {
        Err(DomainError::new(ErrorCode::ImmutabilityViolation, "document versions are never deleted"))
    }
}

#[async_trait]
impl DocumentVersionRepository for PostgresDocumentVersionRepository {
    async fn find_by_document_and_version(&self, document_id: DocumentId, version_number: i32) -> Result<Option<DocumentVersion>, DomainError> {
        let row = sqlx::query("SELECT data FROM document_versions WHERE document_id = $1 AND version_number = $2")
            .bind(document_id.as_uuid())
            .bind(version_number)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(|r| {
            let value: serde_json::Value = r.try_get("data").map_err(db_err)?;
            serde_json::from_value(value).map_err(json_err)
        })
        .transpose()
    }

    async fn all_version_numbers(&self, document_id: DocumentId) -> Result<Vec<i32>, DomainError> {
        let rows = sqlx::query("SELECT version_number FROM document_versions WHERE document_id = $1 ORDER BY version_number")
            .bind(document_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.into_iter().map(|r| r.try_get::<i32, _>("version_number").map_err(db_err)).collect()
    }
}

/// `GenerationInputBatchRepository` backed by `generation_input_batches(id, document_id, version_intent, content_hash, data)`.
#[derive(Clone)]
pub struct PostgresGenerationInputBatchRepository {
    pool: PgPool,
}

impl PostgresGenerationInputBatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<GenerationInputBatch, GenerationInputBatchId> for PostgresGenerationInputBatchRepository {
    async fn find_by_id(&self, id: GenerationInputBatchId) -> Result<Option<GenerationInputBatch>, DomainError> {
        fetch_one(&self.pool, "SELECT data FROM generation_input_batches WHERE id = $1", id.as_uuid()).await
    }

    async fn save(&self, entity: &GenerationInputBatch) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO generation_input_batches (id, document_id, version_intent, content_hash, data) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(entity.id.as_uuid())
        .bind(entity.document_id.as_uuid())
        .bind(entity.version_intent)
        .bind(&entity.content_hash)
        .bind(to_json(entity)?)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn update(&self, entity: &GenerationInputBatch) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let row = sqlx::query("SELECT data FROM generation_input_batches WHERE id = $1 FOR UPDATE")
            .bind(entity.id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::new(ErrorCode::NotFound, format!("generation input batch {} not found", entity.id)))?;
        let current: GenerationInputBatch = serde_json::from_value(row.try_get::<serde_json::Value, _>("data").map_err(db_err)?).map_err(json_err)?;
        if current.is_immutable {
            return Err(DomainError::new(ErrorCode::ImmutabilityViolation, format!("generation input batch {} is immutable", entity.id)));
        }
        sqlx::query("UPDATE generation_input_batches SET content_hash = $2, data = $3 WHERE id = $1")
            .bind(entity.id.as_uuid())
            .bind(&entity.content_hash)
            .bind(to_json(entity)?)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn delete(&self, _id: GenerationInputBatchId) -> Result<(), DomainError> {
        Err(DomainError::new(ErrorCode::ImmutabilityViolation, "generation input batches are never deleted"))
    }
}

#[async_trait]
impl GenerationInputBatchRepository for PostgresGenerationInputBatchRepository {
    async fn batch_by(&self, document_id: DocumentId, version_intent: i32) -> Result<Option<GenerationInputBatch>, DomainError> {
        let row = sqlx::query("SELECT data FROM generation_input_batches WHERE document_id = $1 AND version_intent = $2")
            .bind(document_id.as_uuid())
            .bind(version_intent)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(|r| {
            let value: serde_json::Value = r.try_get("data").map_err(db_err)?;
            serde_json::from_value(value).map_err(json_err)
        })
        .transpose()
    }

    async fn find_by_content_hash(&self, content_hash: &str) -> Result<Option<GenerationInputBatch>, DomainError> {
        let row = sqlx::query("SELECT data FROM generation_input_batches WHERE content_hash = $1")
            .bind(content_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(|r| {
            let value: serde_json::Value = r.try_get("data").map_err(db_err)?;
            serde_json::from_value(value).map_err(json_err)
        })
        .transpose()
    }
}

/// `SectionOutputBatchRepository` backed by `section_output_batches(id, input_batch_id, data)`.
#[derive(Clone)]
pub struct PostgresSectionOutputBatchRepository {
    pool: PgPool,
}

impl PostgresSectionOutputBatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<SectionOutputBatch, SectionOutputBatchId> for PostgresSectionOutputBatchRepository {
    async fn find_by_id(&self, id: SectionOutputBatchId) -> Result<Option<SectionOutputBatch>, DomainError> {
        fetch_one(&self.pool, "SELECT data FROM section_output_batches WHERE id = $1", id.as_uuid()).await
    }

    async fn save(&self, entity: &SectionOutputBatch) -> Result<(), DomainError> {
        sqlx::query("INSERT INTO section_output_batches (id, input_batch_id, data) VALUES ($1, $2, $3)")
            .bind(entity.id.as_uuid())
            .bind(entity.input_batch_id.as_uuid())
            .bind(to_json(entity)?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn update(&self, entity: &SectionOutputBatch) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let row = sqlx::query("SELECT data FROM section_output_batches WHERE id = $1 FOR UPDATE")
            .bind(entity.id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::new(ErrorCode::NotFound, format!("section output batch {} not found", entity.id)))?;
        let current: SectionOutputBatch = serde_json::from_value(row.try_get::<serde_json::Value, _>("data").map_err(db_err)?).map_err(json_err)?;
        if current.is_immutable {
            return Err(DomainError::new(ErrorCode::ImmutabilityViolation, format!("section output batch {} is immutable", entity.id)));
        }
        sqlx::query("UPDATE section_output_batches SET data = $2 WHERE id = $1")
            .bind(entity.id.as_uuid())
            .bind(to_json(entity)?)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn delete(&self, _id: SectionOutputBatchId) -> Result<(), DomainError> {
        Err(DomainError::new(ErrorCode::ImmutabilityViolation, "section output batches are never deleted"))
    }
}

#[async_trait]
impl SectionOutputBatchRepository for PostgresSectionOutputBatchRepository {
    async fn find_by_input_batch(&self, input_batch_id: GenerationInputBatchId) -> Result<Option<SectionOutputBatch>, DomainError> {
        let row = sqlx::query("SELECT data FROM section_output_batches WHERE input_batch_id = $1")
            .bind(input_batch_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(|r| {
            let value: serde_json::Value = r.try_get("data").map_err(db_err)?;
            serde_json::from_value(value).map_err(json_err)
        })
        .transpose()
    }
}

/// `AssembledDocumentRepository` backed by `assembled_documents(id, document_id, version_intent, data)`.
#[derive(Clone)]
pub struct PostgresAssembledDocumentRepository {
    pool: PgPool,
}

impl PostgresAssembledDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<AssembledDocument, AssembledDocumentId> for PostgresAssembledDocumentRepository {
    async fn find_by_id(&self, id: AssembledDocumentId) -> Result<Option<AssembledDocument>, DomainError> {
        fetch_one(&self.pool, "SELECT data FROM assembled_documents WHERE id = $1", id.as_uuid()).await
    }

    async fn save(&self, entity: &AssembledDocument) -> Result<(), DomainError> {
        sqlx::query("INSERT INTO assembled_documents (id, document_id, version_intent, data) VALUES ($1, $2, $3, $4)")
            .bind(entity.id.as_uuid())
            .bind(entity.document_id.as_uuid())
            .bind(entity.version_intent)
            .bind(to_json(entity)?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn update(&self, entity: &AssembledDocument) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let row = sqlx::query("SELECT data FROM assembled_documents WHERE id = $1 FOR UPDATE")
            .bind(entity.id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::new(ErrorCode::NotFound, format!("assembled document {} not found", entity.id)))?;
        let current: AssembledDocument = serde_json::from_value(row.try_get::<serde_json::Value, _>("data").map_err(db_err)?).map_err(json_err)?;
        if current.is_immutable {
            return Err(DomainError::new(ErrorCode::ImmutabilityViolation, format!("assembled document {} is immutable", entity.id)));
        }
        sqlx::query("UPDATE assembled_documents SET data = $2 WHERE id = $1")
            .bind(entity.id.as_uuid())
            .bind(to_json(entity)?)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn delete(&self, _id: AssembledDocumentId) -> Result<(), DomainError> {
        Err(DomainError::new(ErrorCode::ImmutabilityViolation, "assembled documents are never deleted"))
    }
}

#[async_trait]
impl AssembledDocumentRepository for PostgresAssembledDocumentRepository {
    async fn assembled_by(&self, document_id: DocumentId, version_intent: i32) -> Result<Option<AssembledDocument>, DomainError> {
        let row = sqlx::query("SELECT data FROM assembled_documents WHERE document_id = $1 AND version_intent = $2")
            .bind(document_id.as_uuid())
            .bind(version_intent)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(|r| {
            let value: serde_json::Value = r.try_get("data").map_err(db_err)?;
            serde_json::from_value(value).map_err(json_err)
        })
        .transpose()
    }
}

/// `RenderedDocumentRepository` backed by `rendered_documents(id, document_id, version, content_hash, data)`.
#[derive(Clone)]
pub struct PostgresRenderedDocumentRepository {
    pool: PgPool,
}

impl PostgresRenderedDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<RenderedDocument, RenderedDocumentId> for PostgresRenderedDocumentRepository {
    async fn find_by_id(&self, id: RenderedDocumentId) -> Result<Option<RenderedDocument>, DomainError> {
        fetch_one(&self.pool, "SELECT data FROM rendered_documents WHERE id = $1", id.as_uuid()).await
    }

    async fn save(&self, entity: &RenderedDocument) -> Result<(), DomainError> {
        sqlx::query("INSERT INTO rendered_documents (id, document_id, version, content_hash, data) VALUES ($1, $2, $3, $4, $5)")
            .bind(entity.id.as_uuid())
            .bind(entity.document_id.as_uuid())
            .bind(entity.version)
            .bind(&entity.content_hash)
            .bind(to_json(entity)?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn update(&self, entity: &RenderedDocument) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let row = sqlx::query("SELECT data FROM rendered_documents WHERE id = $1 FOR UPDATE")
            .bind(entity.id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::new(ErrorCode::NotFound, format!("rendered document {} not found", entity.id)))?;
        let current: RenderedDocument = serde_json::from_value(row.try_get::<serde_json::Value, _>("data").map_err(db_err)?).map_err(json_err)?;
        if current.is_immutable {
            return Err(DomainError::new(ErrorCode::ImmutabilityViolation, format!("rendered document {} is immutable", entity.id)));
        }
        sqlx::query("UPDATE rendered_documents SET content_hash = $2, data = $3 WHERE id = $1")
            .bind(entity.id.as_uuid())
            .bind(&entity.content_hash)
            .bind(to_json(entity)?)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn delete(&self, _id: RenderedDocumentId) -> Result<(), DomainError> {
        Err(DomainError::new(ErrorCode::ImmutabilityViolation, "rendered documents are never deleted"))
    }
}

#[async_trait]
impl RenderedDocumentRepository for PostgresRenderedDocumentRepository {
    async fn rendered_by(&self, document_id: DocumentId, version: i32) -> Result<Option<RenderedDocument>, DomainError> {
        let row = sqlx::query("SELECT data FROM rendered_documents WHERE document_id = $1 AND version = $2")
            .bind(document_id.as_uuid())
            .bind(version)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(|r| {
            let value: serde_json::Value = r.try_get("data").map_err(db_err)?;
            serde_json::from_value(value).map_err(json_err)
        })
        .transpose()
    }

    async fn find_by_content_hash(&self, content_hash: &str) -> Result<Option<RenderedDocument>, DomainError> {
        let row = sqlx::query("SELECT data FROM rendered_documents WHERE content_hash = $1")
            .bind(content_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(|r| {
            let value: serde_json::Value = r.try_get("data").map_err(db_err)?;
            serde_json::from_value(value).map_err(json_err)
        })
        .transpose()
    }
}

/// `JobRepository` backed by `jobs(id, status, created_at, data)`.
///
/// `claim_pending` is the one place concurrent workers race: `SELECT ... FOR
/// UPDATE SKIP LOCKED` picks the oldest pending job no other transaction has
/// already locked, so two workers polling at once never claim the same row.
#[derive(Clone)]
pub struct PostgresJobRepository {
    pool: PgPool,
}

impl PostgresJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn job_status_to_str(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Pending => "pending",
        JobStatus::Running => "running",
        JobStatus::Completed => "completed",
        JobStatus::Failed => "failed",
    }
}

#[async_trait]
impl Repository<Job, JobId> for PostgresJobRepository {
    async fn find_by_id(&self, id: JobId) -> Result<Option<Job>, DomainError> {
        fetch_one(&self.pool, "SELECT data FROM jobs WHERE id = $1", id.as_uuid()).await
    }

    async fn save(&self, entity: &Job) -> Result<(), DomainError> {
        sqlx::query("INSERT INTO jobs (id, status, created_at, data) VALUES ($1, $2, $3, $4)")
            .bind(entity.id.as_uuid())
            .bind(job_status_to_str(entity.status))
            .bind(entity.created_at.as_datetime())
            .bind(to_json(entity)?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn update(&self, entity: &Job) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE jobs SET status = $2, data = $3 WHERE id = $1")
            .bind(entity.id.as_uuid())
            .bind(job_status_to_str(entity.status))
            .bind(to_json(entity)?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::new(ErrorCode::NotFound, format!("job {} not found", entity.id)));
        }
        Ok(())
    }

    async fn delete(&self, id: JobId) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::new(ErrorCode::NotFound, format!("job {id} not found")));
        }
        Ok(())
    }
}

#[async_trait]
impl JobRepository for PostgresJobRepository {
    async fn claim_pending(&self, worker_id: &str) -> Result<Option<Job>, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let row = sqlx::query(
            "SELECT data FROM jobs WHERE status = 'pending' ORDER BY created_at ASC LIMIT 1 FOR UPDATE SKIP LOCKED",
        )
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        let Some(row) = row else {
            tx.commit().await.map_err(db_err)?;
            return Ok(None);
        };

        let job: Job = serde_json::from_value(row.try_get::<serde_json::Value, _>("data").map_err(db_err)?).map_err(json_err)?;
        let claimed = job.claim(worker_id).map_err(|e| DomainError::new(ErrorCode::InvalidTransition, e.to_string()))?;

        sqlx::query("UPDATE jobs SET status = $2, data = $3 WHERE id = $1")
            .bind(claimed.id.as_uuid())
            .bind(job_status_to_str(claimed.status))
            .bind(to_json(&claimed)?)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(Some(claimed))
    }
}

/// `AuditLogRepository` backed by `audit_log(id, entity_type, entity_id, action, timestamp, data)`.
/// Append-only: no `update`/`delete` exist on the port, matching the
/// "never mutated, never deleted" invariant in §3.
#[derive(Clone)]
pub struct PostgresAuditLogRepository {
    pool: PgPool,
}

impl PostgresAuditLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn entity_type_to_str(entity_type: EntityType) -> &'static str {
    match entity_type {
        EntityType::Template => "template",
        EntityType::TemplateVersion => "template_version",
        EntityType::Section => "section",
        EntityType::Document => "document",
        EntityType::DocumentVersion => "document_version",
        EntityType::GenerationInputBatch => "generation_input_batch",
        EntityType::SectionOutputBatch => "section_output_batch",
        EntityType::AssembledDocument => "assembled_document",
        EntityType::RenderedDocument => "rendered_document",
        EntityType::Job => "job",
    }
}

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
    async fn append(&self, entry: &AuditLogEntry) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO audit_log (id, entity_type, entity_id, action, timestamp, data) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(entry.id.as_uuid())
        .bind(entity_type_to_str(entry.entity_type))
        .bind(&entry.entity_id)
        .bind(&entry.action)
        .bind(entry.timestamp.as_datetime())
        .bind(to_json(entry)?)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn find_by_entity(&self, entity_type: EntityType, entity_id: &str) -> Result<Vec<AuditLogEntry>, DomainError> {
        let rows = sqlx::query("SELECT data FROM audit_log WHERE entity_type = $1 AND entity_id = $2 ORDER BY timestamp ASC")
            .bind(entity_type_to_str(entity_type))
            .bind(entity_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.into_iter()
            .map(|r| {
                let value: serde_json::Value = r.try_get("data").map_err(db_err)?;
                serde_json::from_value(value).map_err(json_err)
            })
            .collect()
    }

    async fn find_by_action(&self, action: &str) -> Result<Vec<AuditLogEntry>, DomainError> {
        let rows = sqlx::query("SELECT data FROM audit_log WHERE action = $1 ORDER BY timestamp ASC")
            .bind(action)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.into_iter()
            .map(|r| {
                let value: serde_json::Value = r.try_get("data").map_err(db_err)?;
                serde_json::from_value(value).map_err(json_err)
            })
            .collect()
    }
}
