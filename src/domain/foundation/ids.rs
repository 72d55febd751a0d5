//! Strongly-typed identifiers for every persisted entity in the pipeline.
//!
//! Each id wraps a `Uuid` (or, for `SectionId`, a plain integer scoped to its
//! owning template version — see the data model's documented exception) so
//! that entity ids can never be confused with one another at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID (e.g. a fixed demo id).
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Returns the inner UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

uuid_id!(TemplateId, "Identifies a `Template`.");
uuid_id!(TemplateVersionId, "Identifies a `TemplateVersion`.");
uuid_id!(DocumentId, "Identifies a `Document`.");
uuid_id!(DocumentVersionId, "Identifies a `DocumentVersion`.");
uuid_id!(GenerationInputBatchId, "Identifies a `GenerationInputBatch`.");
uuid_id!(GenerationInputId, "Identifies a `GenerationInput`.");
uuid_id!(SectionOutputBatchId, "Identifies a `SectionOutputBatch`.");
uuid_id!(SectionOutputId, "Identifies a `SectionOutput`.");
uuid_id!(AssembledDocumentId, "Identifies an `AssembledDocument`.");
uuid_id!(RenderedDocumentId, "Identifies a `RenderedDocument`.");
uuid_id!(JobId, "Identifies a `Job`.");
uuid_id!(AuditLogId, "Identifies an `AuditLog` entry.");

/// Identifies a `Section` within its owning `TemplateVersion`.
///
/// Sections are the one entity in the data model keyed by a small sequential
/// integer rather than a UUID (per the data model's documented exception);
/// the pair `(template_version_id, SectionId)` is the natural key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(i32);

impl SectionId {
    /// Wraps a raw sequential value assigned by the owning template version.
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    /// Returns the raw integer value.
    pub fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for SectionId {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_ids_round_trip_through_display_and_parse() {
        let id = DocumentId::new();
        let parsed: DocumentId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn uuid_ids_are_distinct_across_new_calls() {
        assert_ne!(DocumentId::new(), DocumentId::new());
    }

    #[test]
    fn from_uuid_preserves_value() {
        let raw = Uuid::new_v4();
        let id = JobId::from_uuid(raw);
        assert_eq!(id.as_uuid(), raw);
    }

    #[test]
    fn section_id_wraps_raw_integer() {
        let id = SectionId::new(7);
        assert_eq!(id.value(), 7);
        assert_eq!(id.to_string(), "7");
    }

    #[test]
    fn section_id_orders_by_value() {
        assert!(SectionId::new(1) < SectionId::new(2));
    }
}
