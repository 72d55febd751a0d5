//! PostgreSQL adapters - Artifact Store (C1) implementation.
//!
//! One repository struct per §3 entity, all sharing the JSONB-envelope
//! persistence pattern (see `artifact_store` module docs).

mod artifact_store;

pub use artifact_store::{
    PostgresAssembledDocumentRepository, PostgresAuditLogRepository, PostgresDocumentRepository,
    PostgresDocumentVersionRepository, PostgresGenerationInputBatchRepository,
    PostgresJobRepository, PostgresRenderedDocumentRepository,
    PostgresSectionOutputBatchRepository, PostgresSectionRepository, PostgresTemplateRepository,
    PostgresTemplateVersionRepository,
};
