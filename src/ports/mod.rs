//! Ports - interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between the
//! domain and the outside world; adapters implement them.
//!
//! - `artifact_store` - typed CRUD + natural-key lookups for every entity (C1)
//! - `model_endpoint` - the section-generation model (C3)
//! - `word_codec` - the external binary document format (parse/render)
//! - `object_store` - key/value blob storage for source/parsed/rendered bytes

mod artifact_store;
mod job_handler;
mod model_endpoint;
mod object_store;
mod word_codec;

pub use artifact_store::{
    AssembledDocumentRepository, AuditLogRepository, DocumentRepository,
    DocumentVersionRepository, GenerationInputBatchRepository, JobRepository,
    RenderedDocumentRepository, SectionOutputBatchRepository, SectionRepository,
    TemplateRepository, TemplateVersionRepository,
};
pub use job_handler::JobHandler;
pub use model_endpoint::{InvocationConstraints, InvocationRequest, InvocationResponse, ModelEndpoint};
pub use object_store::{keys, ObjectStore, ObjectStoreError};
pub use word_codec::{verify_determinism, CodecError, RenderedValidation, WordCodecParser, WordCodecRenderer};
