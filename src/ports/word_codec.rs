//! Word Codec Ports - parse and render interfaces over the external binary
//! document format.
//!
//! Two halves of one contract: `WordCodecParser` turns opaque bytes into a
//! `ParsedDocument`, `WordCodecRenderer` turns an `AssembledDocument`'s block
//! tree back into bytes. Neither implementation is given access to the
//! Artifact Store; both are pure w.r.t. their input.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::assembly::AssembledDocument;
use crate::domain::template::ParsedDocument;

/// Port for parsing the external binary document format into a `ParsedDocument`.
#[async_trait]
pub trait WordCodecParser: Send + Sync {
    /// Parse a source document's raw bytes.
    ///
    /// Parsing is pure with respect to the input byte stream: the same bytes
    /// always yield the same `ParsedDocument` (same `content_hash`).
    async fn parse(&self, bytes: &[u8]) -> Result<ParsedDocument, CodecError>;
}

/// Port for rendering an assembled block structure back into document bytes.
#[async_trait]
pub trait WordCodecRenderer: Send + Sync {
    /// Render an assembled document into bytes of the external format.
    ///
    /// Must be deterministic over the same `AssembledDocument`: two calls
    /// with the same `assembly_hash` either produce byte-identical output or,
    /// at minimum, structurally identical output (same paragraph text
    /// sequence, same table cell texts in the same order).
    async fn render(&self, assembled: &AssembledDocument) -> Result<Vec<u8>, CodecError>;

    /// Validate rendered bytes: confirms the output is a well-formed
    /// container with the required parts present and that it opens cleanly.
    fn validate_rendered(&self, bytes: &[u8]) -> Result<RenderedValidation, CodecError>;
}

/// Result of the renderer's own post-render validation pass.
#[derive(Debug, Clone, Default)]
pub struct RenderedValidation {
    pub is_valid_container: bool,
    pub paragraph_count: u32,
    pub table_count: u32,
}

/// Errors surfaced by either half of the word codec.
#[derive(Debug, Clone, Error)]
pub enum CodecError {
    #[error("empty file")]
    EmptyFile,
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    #[error("corrupted file: {0}")]
    CorruptedFile(String),
    #[error("file too large: {size_bytes} bytes (max {max_bytes})")]
    FileTooLarge { size_bytes: u64, max_bytes: u64 },
    #[error("missing content: {0}")]
    MissingContent(String),
    #[error("render failed: {0}")]
    RenderFailed(String),
}

/// Renders `assembled` twice and compares the output. Byte-identical output
/// is the strong guarantee; if the bytes differ (e.g. non-deterministic zip
/// metadata in the codec), falls back to comparing the renderer's own
/// structural counts (paragraphs, tables) as the "at minimum structurally
/// identical" allowance the determinism contract makes.
pub async fn verify_determinism(renderer: &dyn WordCodecRenderer, assembled: &AssembledDocument) -> Result<(bool, String), CodecError> {
    let first = renderer.render(assembled).await?;
    let second = renderer.render(assembled).await?;

    if first == second {
        return Ok((true, "byte-identical".to_string()));
    }

    let first_validation = renderer.validate_rendered(&first)?;
    let second_validation = renderer.validate_rendered(&second)?;
    let structurally_identical =
        first_validation.paragraph_count == second_validation.paragraph_count && first_validation.table_count == second_validation.table_count;

    let detail = if structurally_identical {
        "bytes differ but paragraph/table counts match".to_string()
    } else {
        "paragraph/table counts differ between renders".to_string()
    };
    Ok((structurally_identical, detail))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_error_displays_reason() {
        let err = CodecError::InvalidFormat("not a zip".into());
        assert!(err.to_string().contains("not a zip"));
    }

    #[test]
    fn file_too_large_displays_both_sizes() {
        let err = CodecError::FileTooLarge { size_bytes: 60_000_000, max_bytes: 50_000_000 };
        assert!(err.to_string().contains("60000000"));
        assert!(err.to_string().contains("50000000"));
    }

    #[test]
    fn word_codec_parser_is_object_safe() {
        fn check<T: WordCodecParser + ?Sized>() {}
        check::<dyn WordCodecParser>();
    }

    #[test]
    fn word_codec_renderer_is_object_safe() {
        fn check<T: WordCodecRenderer + ?Sized>() {}
        check::<dyn WordCodecRenderer>();
    }

    use crate::domain::assembly::AssembledDocument;
    use crate::domain::foundation::{DocumentId, SectionOutputBatchId, TemplateVersionId};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample_assembled() -> AssembledDocument {
        AssembledDocument::new_pending(DocumentId::new(), TemplateVersionId::new(), 1, SectionOutputBatchId::new())
    }

    struct StableRenderer;

    #[async_trait]
    impl WordCodecRenderer for StableRenderer {
        async fn render(&self, _assembled: &AssembledDocument) -> Result<Vec<u8>, CodecError> {
            Ok(b"same bytes every time".to_vec())
        }

        fn validate_rendered(&self, _bytes: &[u8]) -> Result<RenderedValidation, CodecError> {
            Ok(RenderedValidation { is_valid_container: true, paragraph_count: 3, table_count: 0 })
        }
    }

    struct UnstableBytesSameStructureRenderer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WordCodecRenderer for UnstableBytesSameStructureRenderer {
        async fn render(&self, _assembled: &AssembledDocument) -> Result<Vec<u8>, CodecError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("render-{n}").into_bytes())
        }

        fn validate_rendered(&self, _bytes: &[u8]) -> Result<RenderedValidation, CodecError> {
            Ok(RenderedValidation { is_valid_container: true, paragraph_count: 2, table_count: 1 })
        }
    }

    #[tokio::test]
    async fn byte_identical_renders_are_deterministic() {
        let (ok, detail) = verify_determinism(&StableRenderer, &sample_assembled()).await.unwrap();
        assert!(ok);
        assert_eq!(detail, "byte-identical");
    }

    #[tokio::test]
    async fn differing_bytes_with_matching_structure_still_counts_as_deterministic() {
        let renderer = UnstableBytesSameStructureRenderer { calls: AtomicUsize::new(0) };
        let (ok, _detail) = verify_determinism(&renderer, &sample_assembled()).await.unwrap();
        assert!(ok);
    }
}
