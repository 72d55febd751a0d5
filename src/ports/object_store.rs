//! Object Store Port - key/value blob storage for source, parsed, and
//! rendered document artifacts.
//!
//! Key conventions (§6): `templates/{template_id}/{version}/source.docx`,
//! `templates/{template_id}/{version}/parsed.json`,
//! `documents/{document_id}/{version}/output.docx`.

use async_trait::async_trait;
use thiserror::Error;

/// Port for content-addressed/key-addressed blob storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write a blob, overwriting any existing value at `key`.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), ObjectStoreError>;

    /// Read a blob, or `None` if the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ObjectStoreError>;

    /// Check existence without reading the full blob.
    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError>;

    /// Delete a blob, returning whether it existed.
    async fn delete(&self, key: &str) -> Result<bool, ObjectStoreError>;
}

/// Key-builder helpers matching §6's fixed conventions.
pub mod keys {
    pub fn template_source(template_id: &str, version: i32) -> String {
        format!("templates/{template_id}/{version}/source.docx")
    }

    pub fn template_parsed(template_id: &str, version: i32) -> String {
        format!("templates/{template_id}/{version}/parsed.json")
    }

    pub fn document_output(document_id: &str, version: i32) -> String {
        format!("documents/{document_id}/{version}/output.docx")
    }
}

/// Errors surfaced by an `ObjectStore` implementation.
#[derive(Debug, Clone, Error)]
pub enum ObjectStoreError {
    #[error("io error: {0}")]
    Io(String),
    #[error("key not found: {0}")]
    NotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_source_key_matches_convention() {
        assert_eq!(keys::template_source("t1", 2), "templates/t1/2/source.docx");
    }

    #[test]
    fn document_output_key_matches_convention() {
        assert_eq!(keys::document_output("d1", 3), "documents/d1/3/output.docx");
    }

    #[test]
    fn object_store_is_object_safe() {
        fn check<T: ObjectStore + ?Sized>() {}
        check::<dyn ObjectStore>();
    }
}
