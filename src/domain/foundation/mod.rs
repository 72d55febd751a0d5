//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, error types, and cross-cutting
//! traits that form the vocabulary used by every pipeline component.

mod command;
mod errors;
mod hashing;
mod ids;
mod repository;
mod state_machine;
mod timestamp;

pub use command::CommandMetadata;
pub use errors::{DomainError, ErrorCategory, ErrorCode, ErrorSeverity, RecoveryHint, ValidationError};
pub use hashing::{sha256_hex, sha256_hex_canonical_json, sha256_hex_str};
pub use ids::{
    AssembledDocumentId, AuditLogId, DocumentId, DocumentVersionId, GenerationInputBatchId,
    GenerationInputId, JobId, RenderedDocumentId, SectionId, SectionOutputBatchId,
    SectionOutputId, TemplateId, TemplateVersionId,
};
pub use repository::{BatchRepository, Repository};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
