//! Object store configuration (§6, §10.2).

use serde::Deserialize;

use super::error::ValidationError;

/// Which `ObjectStore` implementation to construct at startup.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ObjectStoreBackend {
    /// `LocalFileObjectStore` rooted at `base_path` — used in dev and tests.
    #[default]
    LocalFile,
    /// `InMemoryObjectStore` — integration tests only, refused in production.
    InMemory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectStoreConfig {
    #[serde(default)]
    pub backend: ObjectStoreBackend,

    /// Root directory for `ObjectStoreBackend::LocalFile`.
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self { backend: ObjectStoreBackend::default(), base_path: default_base_path() }
    }
}

fn default_base_path() -> String {
    "./data/objects".to_string()
}

impl ObjectStoreConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.backend == ObjectStoreBackend::LocalFile && self.base_path.trim().is_empty() {
            return Err(ValidationError::MissingRequired("object_store.base_path"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_local_file_backend() {
        let config = ObjectStoreConfig::default();
        assert_eq!(config.backend, ObjectStoreBackend::LocalFile);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_empty_base_path_for_local_file_backend() {
        let config = ObjectStoreConfig { backend: ObjectStoreBackend::LocalFile, base_path: String::new() };
        assert!(config.validate().is_err());
    }
}
