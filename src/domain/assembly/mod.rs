//! Assembly domain — the Assembler's (C5) spliced block structure.

mod assembled_document;

pub use assembled_document::{AssembledDocument, AssemblyStatus, BlockCounts};
