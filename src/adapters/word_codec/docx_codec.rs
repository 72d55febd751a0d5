//! Word codec adapter backed by `docx-rs` (parsing) and `zip` (container
//! validation). Implements both halves of the codec port (§6, §4.6).

use async_trait::async_trait;
use std::io::Cursor;

use docx_rs::{
    read_docx, DocumentChild, Docx, Paragraph as DocxParagraph, ParagraphChild, Run, RunChild,
    Table, TableCell, TableRow,
};

use crate::domain::foundation::sha256_hex;
use crate::domain::assembly::AssembledDocument;
use crate::domain::template::{Block, BlockType, ParsedDocument};
use crate::ports::{CodecError, RenderedValidation, WordCodecParser, WordCodecRenderer};

const MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

/// Parses/renders the external `.docx` format.
pub struct DocxCodec;

impl Default for DocxCodec {
    fn default() -> Self {
        Self
    }
}

impl DocxCodec {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl WordCodecParser for DocxCodec {
    async fn parse(&self, bytes: &[u8]) -> Result<ParsedDocument, CodecError> {
        if bytes.is_empty() {
            return Err(CodecError::EmptyFile);
        }
        if bytes.len() as u64 > MAX_FILE_BYTES {
            return Err(CodecError::FileTooLarge { size_bytes: bytes.len() as u64, max_bytes: MAX_FILE_BYTES });
        }

        let docx = read_docx(bytes).map_err(|e| CodecError::CorruptedFile(e.to_string()))?;

        let mut blocks = Vec::new();
        let mut sequence_order = 0i32;
        for child in &docx.document.children {
            if let DocumentChild::Paragraph(paragraph) = child {
                let text = paragraph_text(paragraph);
                if text.trim().is_empty() {
                    continue;
                }
                blocks.push(Block::new(
                    format!("body/{sequence_order}"),
                    sequence_order,
                    BlockType::Paragraph { text },
                ));
                sequence_order += 1;
            }
        }

        if blocks.is_empty() {
            return Err(CodecError::MissingContent("no paragraph content found".to_string()));
        }

        let content_hash = sha256_hex(bytes);
        Ok(ParsedDocument::new(content_hash, blocks, Vec::new(), Vec::new()))
    }
}

#[async_trait]
impl WordCodecRenderer for DocxCodec {
    async fn render(&self, assembled: &AssembledDocument) -> Result<Vec<u8>, CodecError> {
        let mut docx = Docx::new();

        for block in &assembled.assembled_structure {
            match &block.block_type {
                BlockType::Paragraph { text } => {
                    docx = docx.add_paragraph(DocxParagraph::new().add_run(Run::new().add_text(text.as_str())));
                }
                BlockType::Heading { text, .. } => {
                    docx = docx.add_paragraph(DocxParagraph::new().add_run(Run::new().add_text(text.as_str()).bold()));
                }
                BlockType::List { items, .. } => {
                    for item in items {
                        docx = docx.add_paragraph(DocxParagraph::new().add_run(Run::new().add_text(item.as_str())));
                    }
                }
                BlockType::Table { rows } => {
                    let table_rows = rows
                        .iter()
                        .map(|row| {
                            let cells = row
                                .iter()
                                .map(|cell| TableCell::new().add_paragraph(DocxParagraph::new().add_run(Run::new().add_text(cell.as_str()))))
                                .collect();
                            TableRow::new(cells)
                        })
                        .collect();
                    docx = docx.add_table(Table::new(table_rows));
                }
                BlockType::PageBreak | BlockType::SectionBreak => {
                    docx = docx.add_paragraph(DocxParagraph::new().page_break_before(true));
                }
            }
        }

        let mut buffer = Cursor::new(Vec::new());
        docx.build()
            .pack(&mut buffer)
            .map_err(|e| CodecError::RenderFailed(e.to_string()))?;
        Ok(buffer.into_inner())
    }

    fn validate_rendered(&self, bytes: &[u8]) -> Result<RenderedValidation, CodecError> {
        let reader = Cursor::new(bytes);
        let mut archive = zip::ZipArchive::new(reader)
            .map_err(|e| CodecError::InvalidFormat(e.to_string()))?;

        let has_document_xml = archive.by_name("word/document.xml").is_ok();
        let has_content_types = archive.by_name("[Content_Types].xml").is_ok();

        if !has_document_xml || !has_content_types {
            return Ok(RenderedValidation { is_valid_container: false, paragraph_count: 0, table_count: 0 });
        }

        let docx = read_docx(bytes).map_err(|e| CodecError::CorruptedFile(e.to_string()))?;
        let paragraph_count = docx
            .document
            .children
            .iter()
            .filter(|c| matches!(c, DocumentChild::Paragraph(_)))
            .count() as u32;
        let table_count = docx
            .document
            .children
            .iter()
            .filter(|c| matches!(c, DocumentChild::Table(_)))
            .count() as u32;

        Ok(RenderedValidation { is_valid_container: true, paragraph_count, table_count })
    }
}

fn paragraph_text(paragraph: &DocxParagraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                if let RunChild::Text(t) = run_child {
                    text.push_str(&t.text);
                }
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn parse_rejects_empty_bytes() {
        let codec = DocxCodec::new();
        let result = codec.parse(&[]).await;
        assert!(matches!(result, Err(CodecError::EmptyFile)));
    }

    #[tokio::test]
    async fn parse_rejects_oversized_bytes() {
        let codec = DocxCodec::new();
        let bytes = vec![0u8; (MAX_FILE_BYTES + 1) as usize];
        let result = codec.parse(&bytes).await;
        assert!(matches!(result, Err(CodecError::FileTooLarge { .. })));
    }

    #[tokio::test]
    async fn render_then_validate_produces_valid_container() {
        use std::collections::HashMap;

        use crate::domain::assembly::{AssembledDocument, BlockCounts};
        use crate::domain::foundation::{DocumentId, SectionOutputBatchId, TemplateVersionId};

        let counts = BlockCounts { total_blocks: 1, static_blocks_count: 1, dynamic_blocks_count: 0, injected_sections_count: 0 };
        let assembled = AssembledDocument::new_pending(DocumentId::new(), TemplateVersionId::new(), 1, SectionOutputBatchId::new())
            .mark_in_progress()
            .unwrap()
            .mark_completed(
                vec![Block::new("body/0", 0, BlockType::Paragraph { text: "Hello world".into() })],
                vec![],
                vec![],
                HashMap::new(),
                counts,
                "hash",
            )
            .unwrap();

        let codec = DocxCodec::new();
        let bytes = codec.render(&assembled).await.unwrap();
        let validation = codec.validate_rendered(&bytes).unwrap();
        assert!(validation.is_valid_container);
        assert_eq!(validation.paragraph_count, 1);
    }

    #[tokio::test]
    async fn rendered_table_blocks_are_counted_separately_from_paragraphs() {
        use std::collections::HashMap;

        use crate::domain::assembly::{AssembledDocument, BlockCounts};
        use crate::domain::foundation::{DocumentId, SectionOutputBatchId, TemplateVersionId};

        let counts = BlockCounts { total_blocks: 2, static_blocks_count: 2, dynamic_blocks_count: 0, injected_sections_count: 0 };
        let assembled = AssembledDocument::new_pending(DocumentId::new(), TemplateVersionId::new(), 1, SectionOutputBatchId::new())
            .mark_in_progress()
            .unwrap()
            .mark_completed(
                vec![
                    Block::new("body/0", 0, BlockType::Paragraph { text: "Intro".into() }),
                    Block::new(
                        "body/1",
                        1,
                        BlockType::Table { rows: vec![vec!["a".into(), "b".into()], vec!["c".into(), "d".into()]] },
                    ),
                ],
                vec![],
                vec![],
                HashMap::new(),
                counts,
                "hash",
            )
            .unwrap();

        let codec = DocxCodec::new();
        let bytes = codec.render(&assembled).await.unwrap();
        let validation = codec.validate_rendered(&bytes).unwrap();
        assert!(validation.is_valid_container);
        assert_eq!(validation.paragraph_count, 1);
        assert_eq!(validation.table_count, 1);
    }
}
