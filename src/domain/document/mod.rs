//! Document domain — generation targets and their finalized versions.

mod document;
mod document_version;

pub use document::Document;
pub use document_version::{DocumentVersion, GenerationMetadata};
