//! `AuditLogEntry` — one append-only record in the Audit Log (C10).
//!
//! Unlike the teacher's delivery-tracked outbox entries, these are never
//! retried or marked published: once written, an entry is permanent. There
//! is no status field and no mutator.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{AuditLogId, Timestamp};

/// The kind of entity an audit entry is about. A tagged variant rather than
/// a free-form string, per §9's "replace polymorphism with tagged variants".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Template,
    TemplateVersion,
    Section,
    Document,
    DocumentVersion,
    GenerationInputBatch,
    SectionOutputBatch,
    AssembledDocument,
    RenderedDocument,
    Job,
}

/// One append-only audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: AuditLogId,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub action: String,
    pub metadata: Value,
    pub correlation_id: Option<String>,
    pub timestamp: Timestamp,
}

impl AuditLogEntry {
    pub fn new(entity_type: EntityType, entity_id: impl Into<String>, action: impl Into<String>, metadata: Value) -> Self {
        Self {
            id: AuditLogId::new(),
            entity_type,
            entity_id: entity_id.into(),
            action: action.into(),
            metadata,
            correlation_id: None,
            timestamp: Timestamp::now(),
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// A stage-boundary entry as emitted by the Pipeline Coordinator (C9):
    /// `{stage, action, artifact_id}`.
    pub fn stage_event(entity_type: EntityType, entity_id: impl Into<String>, stage: &str, action: &str, artifact_id: Option<String>) -> Self {
        Self::new(
            entity_type,
            entity_id,
            format!("{stage}.{action}"),
            serde_json::json!({ "stage": stage, "action": action, "artifact_id": artifact_id }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_event_composes_action_from_stage_and_action() {
        let entry = AuditLogEntry::stage_event(EntityType::Job, "job-1", "assembly", "completed", Some("assembled-1".into()));
        assert_eq!(entry.action, "assembly.completed");
        assert_eq!(entry.metadata["stage"], "assembly");
    }

    #[test]
    fn carries_optional_correlation_id() {
        let entry = AuditLogEntry::new(EntityType::Document, "doc-1", "regenerate", serde_json::json!({})).with_correlation_id("corr-1");
        assert_eq!(entry.correlation_id.as_deref(), Some("corr-1"));
    }
}
