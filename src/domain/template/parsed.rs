//! The block-tree shape produced by parsing a Word template.
//!
//! Deliberately richer than a flat section list: the renderer needs to
//! reproduce page breaks, tables and headers/footers verbatim, so the parser
//! keeps every structural block it finds rather than collapsing straight to
//! sections. Classification (splitting this tree into `Section`s) is a
//! separate step that runs over `ParsedDocument::blocks`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One structural unit of a parsed document body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockType {
    Paragraph { text: String },
    Heading { level: u8, text: String },
    Table { rows: Vec<Vec<String>> },
    List { items: Vec<String>, ordered: bool },
    PageBreak,
    SectionBreak,
}

/// A positioned `BlockType` within a document's body, header, or footer stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub structural_path: String,
    pub sequence_order: i32,
    pub block_type: BlockType,
}

impl Block {
    pub fn new(structural_path: impl Into<String>, sequence_order: i32, block_type: BlockType) -> Self {
        Self {
            structural_path: structural_path.into(),
            sequence_order,
            block_type,
        }
    }

    pub fn is_table(&self) -> bool {
        matches!(self.block_type, BlockType::Table { .. })
    }

    pub fn is_break(&self) -> bool {
        matches!(self.block_type, BlockType::PageBreak | BlockType::SectionBreak)
    }
}

/// Summary counters computed once at parse time, persisted alongside the
/// block tree so downstream components don't have to re-walk it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedStatistics {
    pub block_count: usize,
    pub table_count: usize,
    pub header_block_count: usize,
    pub footer_block_count: usize,
}

/// The full output of parsing a template's source blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub content_hash: String,
    pub metadata: HashMap<String, String>,
    pub blocks: Vec<Block>,
    pub headers: Vec<Block>,
    pub footers: Vec<Block>,
    pub statistics: ParsedStatistics,
}

impl ParsedDocument {
    pub fn new(content_hash: impl Into<String>, blocks: Vec<Block>, headers: Vec<Block>, footers: Vec<Block>) -> Self {
        let statistics = ParsedStatistics {
            block_count: blocks.len(),
            table_count: blocks.iter().filter(|b| b.is_table()).count(),
            header_block_count: headers.len(),
            footer_block_count: footers.len(),
        };
        Self {
            content_hash: content_hash.into(),
            metadata: HashMap::new(),
            blocks,
            headers,
            footers,
            statistics,
        }
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Structural paths in body-stream order, the unit `Section`s are keyed by.
    pub fn structural_paths(&self) -> Vec<&str> {
        self.blocks.iter().map(|b| b.structural_path.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_blocks() -> Vec<Block> {
        vec![
            Block::new("body/0", 0, BlockType::Heading { level: 1, text: "Engagement Letter".into() }),
            Block::new("body/1", 1, BlockType::Paragraph { text: "Dear {{client_name}},".into() }),
            Block::new(
                "body/2",
                2,
                BlockType::Table {
                    rows: vec![vec!["Fee".into(), "Amount".into()], vec!["Retainer".into(), "$5,000".into()]],
                },
            ),
            Block::new("body/3", 3, BlockType::PageBreak),
        ]
    }

    #[test]
    fn statistics_reflect_block_composition() {
        let doc = ParsedDocument::new("hash123", sample_blocks(), vec![], vec![]);
        assert_eq!(doc.statistics.block_count, 4);
        assert_eq!(doc.statistics.table_count, 1);
        assert_eq!(doc.statistics.header_block_count, 0);
    }

    #[test]
    fn structural_paths_preserve_body_order() {
        let doc = ParsedDocument::new("hash123", sample_blocks(), vec![], vec![]);
        assert_eq!(doc.structural_paths(), vec!["body/0", "body/1", "body/2", "body/3"]);
    }

    #[test]
    fn empty_block_list_is_empty() {
        let doc = ParsedDocument::new("hash123", vec![], vec![], vec![]);
        assert!(doc.is_empty());
    }
}
