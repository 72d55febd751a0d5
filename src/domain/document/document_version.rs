//! `DocumentVersion` entity — one finalized version of a `Document`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DocumentId, DocumentVersionId, Timestamp};

/// Provenance recorded alongside a finalized version: the hashes that let a
/// caller prove what went in and came out, plus per-stage timings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    pub input_hash: String,
    pub content_hash: String,
    pub stage_timings_ms: HashMap<String, u64>,
}

impl GenerationMetadata {
    pub fn new(input_hash: impl Into<String>, content_hash: impl Into<String>) -> Self {
        Self {
            input_hash: input_hash.into(),
            content_hash: content_hash.into(),
            stage_timings_ms: HashMap::new(),
        }
    }

    pub fn with_stage_timing(mut self, stage: impl Into<String>, millis: u64) -> Self {
        self.stage_timings_ms.insert(stage.into(), millis);
        self
    }
}

/// One finalized version of a `Document`. Always immutable: there is no
/// mutator because the pipeline only ever creates a row here once a version
/// has fully succeeded — see C9's versioning stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentVersion {
    pub id: DocumentVersionId,
    pub document_id: DocumentId,
    pub version_number: i32,
    pub rendered_blob_key: String,
    pub generation_metadata: GenerationMetadata,
    pub created_at: Timestamp,
}

impl DocumentVersion {
    pub fn new(
        document_id: DocumentId,
        version_number: i32,
        rendered_blob_key: impl Into<String>,
        generation_metadata: GenerationMetadata,
    ) -> Self {
        Self {
            id: DocumentVersionId::new(),
            document_id,
            version_number,
            rendered_blob_key: rendered_blob_key.into(),
            generation_metadata,
            created_at: Timestamp::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_one_carries_generation_metadata() {
        let meta = GenerationMetadata::new("inhash", "outhash").with_stage_timing("assembly", 42);
        let version = DocumentVersion::new(DocumentId::new(), 1, "documents/d1/1/rendered.docx", meta);
        assert_eq!(version.version_number, 1);
        assert_eq!(version.generation_metadata.input_hash, "inhash");
        assert_eq!(version.generation_metadata.stage_timings_ms.get("assembly"), Some(&42));
    }
}
