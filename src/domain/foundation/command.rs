//! Command infrastructure for pipeline operations.
//!
//! This module provides `CommandMetadata` — context that flows through every
//! application-layer handler and is threaded onto audit log entries as the
//! job's correlation id.
//!
//! # DRY Pattern
//!
//! Instead of each handler accepting `correlation_id: Option<String>,
//! trace_id: Option<String>` separately, they accept a single
//! `CommandMetadata` struct.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata context for command handlers.
///
/// Carries tracing and correlation context through the pipeline. Every
/// stage boundary emitted to the Audit Log (C10) carries the same
/// correlation id for one logical job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMetadata {
    /// Links related operations across one logical job.
    /// Generated at API/worker boundary if not provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,

    /// Distributed tracing span/trace ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,

    /// Source of this command (e.g., "http", "scheduler", "demo").
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

impl CommandMetadata {
    /// Creates empty metadata; a correlation id is generated lazily on first read.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates metadata with all optional fields populated.
    pub fn with_all(
        correlation_id: Option<String>,
        trace_id: Option<String>,
        source: Option<String>,
    ) -> Self {
        Self {
            correlation_id,
            trace_id,
            source,
        }
    }

    /// Builder: Add correlation ID for request tracing.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Builder: Add trace ID for distributed tracing.
    pub fn with_trace_id(mut self, id: impl Into<String>) -> Self {
        self.trace_id = Some(id.into());
        self
    }

    /// Builder: Add source identifier.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the correlation ID, generating one if not set.
    pub fn correlation_id(&self) -> String {
        self.correlation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }

    /// Returns the correlation ID only if explicitly set.
    pub fn correlation_id_opt(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// Returns the trace ID if set.
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Returns the source if set.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

#[cfg(test)]
impl CommandMetadata {
    /// Creates a test fixture with a fixed correlation id.
    pub fn test_fixture() -> Self {
        Self::new()
            .with_correlation_id("test-correlation-id")
            .with_source("test")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_with_no_fields_set() {
        let metadata = CommandMetadata::new();
        assert!(metadata.correlation_id_opt().is_none());
        assert!(metadata.trace_id().is_none());
        assert!(metadata.source().is_none());
    }

    #[test]
    fn builder_chain_sets_all_fields() {
        let metadata = CommandMetadata::new()
            .with_correlation_id("corr-123")
            .with_trace_id("trace-456")
            .with_source("api");

        assert_eq!(metadata.correlation_id_opt(), Some("corr-123"));
        assert_eq!(metadata.trace_id(), Some("trace-456"));
        assert_eq!(metadata.source(), Some("api"));
    }

    #[test]
    fn correlation_id_generates_if_missing() {
        let metadata = CommandMetadata::new();
        let id = metadata.correlation_id();
        assert!(!id.is_empty());
    }

    #[test]
    fn correlation_id_returns_set_value() {
        let metadata = CommandMetadata::new().with_correlation_id("my-correlation-id");
        assert_eq!(metadata.correlation_id(), "my-correlation-id");
    }

    #[test]
    fn with_all_populates_all_fields() {
        let metadata = CommandMetadata::with_all(
            Some("corr-all".to_string()),
            Some("trace-all".to_string()),
            Some("scheduler".to_string()),
        );

        assert_eq!(metadata.correlation_id_opt(), Some("corr-all"));
        assert_eq!(metadata.trace_id(), Some("trace-all"));
        assert_eq!(metadata.source(), Some("scheduler"));
    }

    #[test]
    fn serialization_round_trip() {
        let metadata = CommandMetadata::new()
            .with_correlation_id("ser-corr")
            .with_trace_id("ser-trace");

        let json = serde_json::to_string(&metadata).unwrap();
        let restored: CommandMetadata = serde_json::from_str(&json).unwrap();

        assert_eq!(metadata, restored);
    }

    #[test]
    fn serialization_skips_none_fields() {
        let metadata = CommandMetadata::new();
        let json = serde_json::to_string(&metadata).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_fixture_creates_valid_metadata() {
        let metadata = CommandMetadata::test_fixture();
        assert_eq!(metadata.correlation_id(), "test-correlation-id");
        assert_eq!(metadata.source(), Some("test"));
    }
}
