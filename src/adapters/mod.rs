//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `model_endpoint` - AI model invocation implementations (production, scripted mock, deterministic mock)
//! - `object_store` - Blob storage implementations (local filesystem, in-memory)
//! - `word_codec` - Word document parse/render implementation
//! - `events` - Job scheduler / worker-loop implementation
//! - `http` - HTTP/REST API implementation
//! - `postgres` - PostgreSQL artifact store implementation

pub mod events;
pub mod http;
pub mod in_memory_artifact_store;
pub mod model_endpoint;
pub mod object_store;
pub mod postgres;
pub mod word_codec;

pub use events::{JobWorkerLoop, WorkerLoopConfig};
pub use model_endpoint::{
    DeterministicMockModelEndpoint, HttpModelEndpoint, HttpModelEndpointConfig,
    ScriptedMockModelEndpoint, ScriptedOutcome,
};
pub use in_memory_artifact_store::{
    InMemoryAssembledDocumentRepository, InMemoryAuditLogRepository, InMemoryDocumentRepository,
    InMemoryDocumentVersionRepository, InMemoryGenerationInputBatchRepository,
    InMemoryJobRepository, InMemoryRenderedDocumentRepository,
    InMemorySectionOutputBatchRepository, InMemorySectionRepository, InMemoryTemplateRepository,
    InMemoryTemplateVersionRepository,
};
pub use object_store::{InMemoryObjectStore, LocalFileObjectStore};
pub use postgres::{
    PostgresAssembledDocumentRepository, PostgresAuditLogRepository, PostgresDocumentRepository,
    PostgresDocumentVersionRepository, PostgresGenerationInputBatchRepository,
    PostgresJobRepository, PostgresRenderedDocumentRepository,
    PostgresSectionOutputBatchRepository, PostgresSectionRepository, PostgresTemplateRepository,
    PostgresTemplateVersionRepository,
};
pub use word_codec::DocxCodec;
